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

use crate::domain::config::RuntimeChoice;
use crate::shared::diagnostic::sanitize_output;
use crate::shared::error::{ErrorKind, KindError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Lifecycle phase of a cluster resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ClusterPhase {
    Absent,
    Creating,
    Present,
    Deleting,
    Failed,
}

impl ClusterPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterPhase::Absent => "Absent",
            ClusterPhase::Creating => "Creating",
            ClusterPhase::Present => "Present",
            ClusterPhase::Deleting => "Deleting",
            ClusterPhase::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ClusterPhase::Absent | ClusterPhase::Failed)
    }
}

impl fmt::Display for ClusterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kubeconfig document. Holds credentials, so formatting never shows it.
#[derive(Clone, PartialEq, Eq)]
pub struct Kubeconfig(String);

impl Kubeconfig {
    pub fn new(document: impl Into<String>) -> Self {
        Self(document.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Writes the document to `path`, creating parent directories. On unix the
    /// file is owner-only from creation on, and an existing file is narrowed
    /// to 0600 before it is overwritten.
    pub async fn write_to(&self, path: &Path) -> Result<(), KindError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(path).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }
        file.write_all(self.0.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

impl fmt::Debug for Kubeconfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kubeconfig([REDACTED; {} bytes])", self.0.len())
    }
}

impl fmt::Display for Kubeconfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Observed state, always derived from a fresh read of the kind tool.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterState {
    pub name: String,
    pub runtime: RuntimeChoice,
    pub exists: bool,
    pub phase: ClusterPhase,
    #[serde(skip)]
    pub kubeconfig: Option<Kubeconfig>,
    pub context: Option<String>,
    pub server: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl ClusterState {
    pub fn absent(name: impl Into<String>, runtime: RuntimeChoice) -> Self {
        Self {
            name: name.into(),
            runtime,
            exists: false,
            phase: ClusterPhase::Absent,
            kubeconfig: None,
            context: None,
            server: None,
            observed_at: Utc::now(),
        }
    }

    pub fn present(
        name: impl Into<String>,
        runtime: RuntimeChoice,
        kubeconfig: Kubeconfig,
    ) -> Self {
        Self {
            name: name.into(),
            runtime,
            exists: true,
            phase: ClusterPhase::Present,
            kubeconfig: Some(kubeconfig),
            context: None,
            server: None,
            observed_at: Utc::now(),
        }
    }

    pub fn with_endpoint(mut self, context: Option<String>, server: Option<String>) -> Self {
        self.context = context;
        self.server = server;
        self
    }
}

/// Outcome of one operation, in the non-throwing shape handed to hosts.
#[derive(Debug)]
pub enum OperationResult {
    Success(ClusterState),
    NotFound,
    Failure {
        kind: ErrorKind,
        message: String,
        raw_output: String,
    },
}

impl OperationResult {
    pub fn from_read(result: Result<Option<ClusterState>, KindError>) -> Self {
        match result {
            Ok(Some(state)) => OperationResult::Success(state),
            Ok(None) => OperationResult::NotFound,
            Err(err) if err.kind() == ErrorKind::NotFound => OperationResult::NotFound,
            Err(err) => OperationResult::from_error(&err),
        }
    }

    pub fn from_error(err: &KindError) -> Self {
        OperationResult::Failure {
            kind: err.kind(),
            message: err.to_string(),
            raw_output: err.raw_output().map(sanitize_output).unwrap_or_default(),
        }
    }

    pub fn phase(&self) -> ClusterPhase {
        match self {
            OperationResult::Success(state) => state.phase,
            OperationResult::NotFound => ClusterPhase::Absent,
            OperationResult::Failure { .. } => ClusterPhase::Failed,
        }
    }
}
