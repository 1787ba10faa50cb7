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

//! Interpretation of kind's stdout, stderr and exit codes.

use crate::domain::cluster::Kubeconfig;
use crate::infrastructure::process::ProcessOutput;
use crate::shared::error::KindError;
use tracing::warn;

/// Shell convention for "command not found".
const EXIT_COMMAND_NOT_FOUND: i32 = 127;

const RUNTIME_UNAVAILABLE_PATTERNS: &[&str] = &[
    "executable file not found",
    "command not found",
    "cannot connect to the docker daemon",
    "is the docker daemon running",
    "cannot connect to podman",
];

const ALREADY_EXISTS_PATTERNS: &[&str] = &["already exist"];

const NOT_FOUND_PATTERNS: &[&str] = &[
    "no such cluster",
    "unknown cluster",
    "could not locate any control plane nodes",
    "not found",
];

/// One cluster name per line; blank output means no clusters.
pub fn parse_cluster_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        // Older kind releases print this notice on stdout.
        .filter(|line| !line.starts_with("No kind clusters found"))
        .map(str::to_string)
        .collect()
}

/// The whole of stdout is the kubeconfig; a cluster always has one.
pub fn parse_kubeconfig(command: &str, output: &ProcessOutput) -> Result<Kubeconfig, KindError> {
    let kubeconfig = Kubeconfig::new(output.stdout_str());
    if kubeconfig.is_empty() {
        return Err(KindError::UnexpectedEmptyOutput {
            command: command.to_string(),
        });
    }
    Ok(kubeconfig)
}

/// Current context and API server of a kubeconfig.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubeconfigSummary {
    pub context: Option<String>,
    pub server: Option<String>,
}

pub fn summarize_kubeconfig(kubeconfig: &Kubeconfig) -> KubeconfigSummary {
    let parsed = match kube::config::Kubeconfig::from_yaml(kubeconfig.expose()) {
        Ok(parsed) => parsed,
        Err(e) => {
            // The document itself must stay out of logs.
            warn!(error = %e, "Failed to parse kubeconfig returned by kind");
            return KubeconfigSummary::default();
        }
    };

    let context = parsed
        .current_context
        .clone()
        .or_else(|| parsed.contexts.first().map(|c| c.name.clone()));

    let cluster_name = context.as_ref().and_then(|name| {
        parsed
            .contexts
            .iter()
            .find(|c| &c.name == name)
            .and_then(|c| c.context.as_ref())
            .map(|c| c.cluster.clone())
    });

    let server = parsed
        .clusters
        .iter()
        .find(|c| cluster_name.as_ref().map_or(true, |name| &c.name == name))
        .and_then(|c| c.cluster.as_ref())
        .and_then(|c| c.server.clone());

    KubeconfigSummary { context, server }
}

/// Maps a failed kind invocation to a classified error.
pub fn classify_failure(name: &str, command: &str, output: &ProcessOutput) -> KindError {
    let stderr = output.stderr_str();
    let haystack = stderr.to_lowercase();
    let matches_any = |patterns: &[&str]| patterns.iter().any(|p| haystack.contains(p));

    // Checked before "not found": a missing docker binary also says "not found".
    if output.exit_code == EXIT_COMMAND_NOT_FOUND || matches_any(RUNTIME_UNAVAILABLE_PATTERNS) {
        return KindError::RuntimeUnavailable {
            message: format!("'{}' could not reach a container runtime", command),
            stderr,
        };
    }

    if matches_any(ALREADY_EXISTS_PATTERNS) {
        return KindError::already_exists(name, stderr);
    }

    if matches_any(NOT_FOUND_PATTERNS) {
        return KindError::not_found(name);
    }

    KindError::Unknown {
        command: command.to_string(),
        exit_code: output.exit_code,
        stderr,
    }
}
