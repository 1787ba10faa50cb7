// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KindError>;

/// Classification of every failure the crate can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
    InvalidConfiguration,
    RuntimeUnavailable,
    AlreadyExists,
    NotFound,
    Timeout,
    Cancelled,
    UnexpectedEmptyOutput,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidConfiguration => "InvalidConfiguration",
            ErrorKind::RuntimeUnavailable => "RuntimeUnavailable",
            ErrorKind::AlreadyExists => "AlreadyExists",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::UnexpectedEmptyOutput => "UnexpectedEmptyOutput",
            ErrorKind::Unknown => "Unknown",
        }
    }

    /// Kinds a side-effect-free operation may be retried on.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::Unknown)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum KindError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Container runtime unavailable: {message}")]
    RuntimeUnavailable { message: String, stderr: String },

    #[error("Executable '{program}' not found on the search path")]
    ExecutableNotFound { program: String },

    #[error("Cluster '{name}' already exists")]
    AlreadyExists { name: String, stderr: String },

    #[error("Cluster '{name}' not found")]
    NotFound { name: String },

    #[error("Command '{command}' timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    #[error("Command '{command}' was cancelled")]
    Cancelled { command: String },

    #[error("Command '{command}' succeeded but produced no output")]
    UnexpectedEmptyOutput { command: String },

    #[error("Command '{command}' failed with exit code {exit_code}")]
    Unknown {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl KindError {
    pub fn invalid_configuration(context: impl Into<String>) -> Self {
        Self::InvalidConfiguration(context.into())
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn already_exists(name: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::AlreadyExists {
            name: name.into(),
            stderr: stderr.into(),
        }
    }

    pub fn timeout(command: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            command: command.into(),
            timeout,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            KindError::InvalidConfiguration(_)
            | KindError::YamlParse(_)
            | KindError::TomlParse(_)
            | KindError::JsonParse(_) => ErrorKind::InvalidConfiguration,
            KindError::RuntimeUnavailable { .. } | KindError::ExecutableNotFound { .. } => {
                ErrorKind::RuntimeUnavailable
            }
            KindError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            KindError::NotFound { .. } => ErrorKind::NotFound,
            KindError::Timeout { .. } => ErrorKind::Timeout,
            KindError::Cancelled { .. } => ErrorKind::Cancelled,
            KindError::UnexpectedEmptyOutput { .. } => ErrorKind::UnexpectedEmptyOutput,
            KindError::Unknown { .. } | KindError::Io(_) => ErrorKind::Unknown,
        }
    }

    /// Raw tool stderr carried by the failure, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            KindError::RuntimeUnavailable { stderr, .. }
            | KindError::AlreadyExists { stderr, .. }
            | KindError::Unknown { stderr, .. } => Some(stderr.as_str()),
            _ => None,
        }
    }
}
