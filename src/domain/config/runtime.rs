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

use crate::infrastructure::constants::{RUNTIME_DOCKER, RUNTIME_PODMAN};
use crate::infrastructure::process::ExecutableLookup;
use crate::shared::error::KindError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// Container runtime backing the kind nodes. Resolved once when the provider
/// is configured and passed by value to everything below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeChoice {
    Docker,
    Podman,
}

impl RuntimeChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeChoice::Docker => RUNTIME_DOCKER,
            RuntimeChoice::Podman => RUNTIME_PODMAN,
        }
    }

    /// Uses `configured` when it is set and non-empty, otherwise looks
    /// for podman and then docker on the search path.
    pub fn resolve(
        configured: Option<&str>,
        lookup: &dyn ExecutableLookup,
    ) -> Result<Self, KindError> {
        match configured.filter(|value| !value.is_empty()) {
            Some(value) => value.parse(),
            None => Ok(Self::detect(lookup)),
        }
    }

    /// Podman is checked first: anyone who installed it alongside docker most
    /// likely wants it.
    pub fn detect(lookup: &dyn ExecutableLookup) -> Self {
        for runtime in [RuntimeChoice::Podman, RuntimeChoice::Docker] {
            if let Some(path) = lookup.find(runtime.as_str()) {
                info!(runtime = %runtime, path = %path.display(), "Detected container runtime");
                return runtime;
            }
        }

        // TODO: fail here with RuntimeUnavailable once callers can surface
        // configuration-time errors; the fallback only defers the failure.
        warn!(
            "Neither podman nor docker found on PATH, falling back to docker; \
             cluster operations will fail until a runtime is installed"
        );
        RuntimeChoice::Docker
    }
}

impl fmt::Display for RuntimeChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RuntimeChoice {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            RUNTIME_DOCKER => Ok(RuntimeChoice::Docker),
            RUNTIME_PODMAN => Ok(RuntimeChoice::Podman),
            _ => Err(KindError::InvalidConfiguration(format!(
                "Invalid runtime '{}': runtime must be either 'docker' or 'podman'",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::error::ErrorKind;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingLookup {
        available: Vec<&'static str>,
        searched: Mutex<Vec<String>>,
    }

    impl RecordingLookup {
        fn with(available: &[&'static str]) -> Self {
            Self {
                available: available.to_vec(),
                searched: Mutex::new(Vec::new()),
            }
        }

        fn searched(&self) -> Vec<String> {
            self.searched.lock().unwrap().clone()
        }
    }

    impl ExecutableLookup for RecordingLookup {
        fn find(&self, program: &str) -> Option<PathBuf> {
            self.searched.lock().unwrap().push(program.to_string());
            self.available
                .contains(&program)
                .then(|| PathBuf::from("/usr/bin").join(program))
        }
    }

    #[test]
    fn test_explicit_runtime_skips_path_search() {
        for value in ["docker", "podman"] {
            let lookup = RecordingLookup::with(&[]);
            let runtime = RuntimeChoice::resolve(Some(value), &lookup).unwrap();
            assert_eq!(runtime.as_str(), value);
            assert!(lookup.searched().is_empty());
        }
    }

    #[test]
    fn test_invalid_runtime() {
        let lookup = RecordingLookup::with(&["docker"]);
        for value in ["Docker", "containerd", " podman"] {
            let err = RuntimeChoice::resolve(Some(value), &lookup).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        }
        assert!(lookup.searched().is_empty());
    }

    #[test]
    fn test_empty_runtime_triggers_detection() {
        let lookup = RecordingLookup::with(&["docker"]);
        let runtime = RuntimeChoice::resolve(Some(""), &lookup).unwrap();
        assert_eq!(runtime, RuntimeChoice::Docker);
        assert_eq!(lookup.searched(), vec!["podman", "docker"]);
    }

    #[test]
    fn test_podman_preferred() {
        let lookup = RecordingLookup::with(&["docker", "podman"]);
        assert_eq!(
            RuntimeChoice::resolve(None, &lookup).unwrap(),
            RuntimeChoice::Podman
        );
        assert_eq!(lookup.searched(), vec!["podman"]);
    }

    #[test]
    fn test_falls_back_to_docker() {
        let lookup = RecordingLookup::with(&[]);
        assert_eq!(
            RuntimeChoice::resolve(None, &lookup).unwrap(),
            RuntimeChoice::Docker
        );
        assert_eq!(lookup.searched(), vec!["podman", "docker"]);
    }
}
