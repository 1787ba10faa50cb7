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

use crate::domain::config::runtime::RuntimeChoice;
use crate::infrastructure::constants::{
    DEFAULT_CREATE_TIMEOUT_SECS, DEFAULT_DELETE_TIMEOUT_SECS, DEFAULT_READ_RETRIES,
    DEFAULT_READ_RETRY_MIN_DELAY_MS, DEFAULT_READ_TIMEOUT_SECS, KIND_BINARY,
};
use crate::infrastructure::process::ExecutableLookup;
use crate::shared::error::KindError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Provider-level settings shared by every cluster resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// "docker", "podman", or unset to auto-detect
    pub runtime: Option<String>,
    pub kind_binary: String,
    pub timeouts: TimeoutConfig,
    pub read_retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    pub create_secs: u64,
    pub read_secs: u64,
    pub delete_secs: u64,
}

/// Backoff for reads, the only operation safe to repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_times: usize,
    pub min_delay_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            runtime: None,
            kind_binary: KIND_BINARY.to_string(),
            timeouts: TimeoutConfig::default(),
            read_retry: RetryConfig::default(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            create_secs: DEFAULT_CREATE_TIMEOUT_SECS,
            read_secs: DEFAULT_READ_TIMEOUT_SECS,
            delete_secs: DEFAULT_DELETE_TIMEOUT_SECS,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_times: DEFAULT_READ_RETRIES,
            min_delay_ms: DEFAULT_READ_RETRY_MIN_DELAY_MS,
        }
    }
}

impl TimeoutConfig {
    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn delete(&self) -> Duration {
        Duration::from_secs(self.delete_secs)
    }
}

impl RetryConfig {
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }
}

impl ProviderConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, KindError> {
        let config: ProviderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KindError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            KindError::InvalidConfiguration(format!(
                "Failed to read provider config '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), KindError> {
        if self.kind_binary.trim().is_empty() {
            return Err(KindError::InvalidConfiguration(
                "kind_binary must not be empty".to_string(),
            ));
        }

        if let Some(runtime) = self.runtime.as_deref().filter(|r| !r.is_empty()) {
            runtime.parse::<RuntimeChoice>()?;
        }

        for (name, secs) in [
            ("timeouts.create_secs", self.timeouts.create_secs),
            ("timeouts.read_secs", self.timeouts.read_secs),
            ("timeouts.delete_secs", self.timeouts.delete_secs),
        ] {
            if secs == 0 {
                return Err(KindError::InvalidConfiguration(format!(
                    "{} must be > 0",
                    name
                )));
            }
        }

        Ok(())
    }

    pub fn resolve_runtime(
        &self,
        lookup: &dyn ExecutableLookup,
    ) -> Result<RuntimeChoice, KindError> {
        RuntimeChoice::resolve(self.runtime.as_deref(), lookup)
    }
}
