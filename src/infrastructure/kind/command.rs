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

use crate::domain::cluster::{ClusterSpec, ClusterSpecValidator};
use crate::domain::config::RuntimeChoice;
use crate::infrastructure::constants::{KIND_BINARY, KIND_PROVIDER_ENV, STDIN_CONFIG_PATH};
use crate::infrastructure::kind::config::KindClusterConfig;
use crate::infrastructure::process::Invocation;
use crate::shared::error::KindError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindOperation {
    Create,
    ListClusters,
    GetKubeconfig,
    Delete,
}

/// Builds kind invocations. Pure: nothing here touches the system.
#[derive(Debug, Clone)]
pub struct KindCommandBuilder {
    binary: String,
    runtime: RuntimeChoice,
}

impl KindCommandBuilder {
    pub fn new(runtime: RuntimeChoice) -> Self {
        Self {
            binary: KIND_BINARY.to_string(),
            runtime,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn runtime(&self) -> RuntimeChoice {
        self.runtime
    }

    pub fn build(
        &self,
        spec: &ClusterSpec,
        operation: KindOperation,
    ) -> Result<Invocation, KindError> {
        match operation {
            KindOperation::Create => self.create(spec),
            KindOperation::ListClusters => Ok(self.list_clusters()),
            KindOperation::GetKubeconfig => Ok(self.get_kubeconfig(&spec.name)),
            KindOperation::Delete => Ok(self.delete(&spec.name)),
        }
    }

    /// `kind create cluster --name <name> [--image <img>] [--wait <n>s] --config -`
    ///
    /// A raw config document goes to stdin untouched; otherwise one is
    /// generated from the structured fields.
    pub fn create(&self, spec: &ClusterSpec) -> Result<Invocation, KindError> {
        let mut invocation = self
            .base()
            .args(["create", "cluster", "--name", spec.name.as_str()]);

        if let Some(image) = spec.node_image() {
            invocation = invocation.args(["--image", image]);
        }

        if let Some(wait) = spec.wait_for_ready.filter(|secs| *secs > 0) {
            invocation = invocation.args(["--wait".to_string(), format!("{}s", wait)]);
        }

        let document = match spec.raw_config() {
            Some(raw) => raw.to_string(),
            None => {
                // Bounds the node list before it is materialised.
                ClusterSpecValidator::validate_node_counts(spec)?;
                KindClusterConfig::from_spec(spec).to_yaml()?
            }
        };

        Ok(invocation
            .args(["--config", STDIN_CONFIG_PATH])
            .stdin(document.into_bytes()))
    }

    /// `kind get clusters`; filtering by name is left to the caller.
    pub fn list_clusters(&self) -> Invocation {
        self.base().args(["get", "clusters"])
    }

    pub fn get_kubeconfig(&self, name: &str) -> Invocation {
        self.base().args(["get", "kubeconfig", "--name", name])
    }

    pub fn delete(&self, name: &str) -> Invocation {
        self.base().args(["delete", "cluster", "--name", name])
    }

    fn base(&self) -> Invocation {
        Invocation::new(self.binary.as_str()).env(KIND_PROVIDER_ENV, self.runtime.as_str())
    }
}

/// Free-function form of [`KindCommandBuilder::build`].
pub fn build_command(
    spec: &ClusterSpec,
    runtime: RuntimeChoice,
    operation: KindOperation,
) -> Result<Invocation, KindError> {
    KindCommandBuilder::new(runtime).build(spec, operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cluster::NetworkingSpec;

    #[test]
    fn test_minimal_create() {
        let invocation = build_command(
            &ClusterSpec::new("ci-test"),
            RuntimeChoice::Docker,
            KindOperation::Create,
        )
        .unwrap();
        assert_eq!(invocation.program, "kind");
        assert_eq!(
            invocation.args,
            vec!["create", "cluster", "--name", "ci-test", "--config", "-"]
        );
        assert_eq!(
            invocation.env,
            vec![(KIND_PROVIDER_ENV.to_string(), "docker".to_string())]
        );
        let stdin = String::from_utf8(invocation.stdin.unwrap()).unwrap();
        assert!(stdin.contains("role: control-plane"));
    }

    #[test]
    fn test_create_with_image_and_wait() {
        let spec = ClusterSpec {
            node_image: Some("kindest/node:v1.30.0".to_string()),
            wait_for_ready: Some(90),
            ..ClusterSpec::new("dev")
        };
        let invocation = KindCommandBuilder::new(RuntimeChoice::Podman)
            .create(&spec)
            .unwrap();
        assert_eq!(
            invocation.args,
            vec![
                "create",
                "cluster",
                "--name",
                "dev",
                "--image",
                "kindest/node:v1.30.0",
                "--wait",
                "90s",
                "--config",
                "-"
            ]
        );
        assert_eq!(invocation.env[0].1, "podman");
    }

    #[test]
    fn test_raw_config_is_passed_verbatim() {
        let raw = "kind: Cluster\napiVersion: kind.x-k8s.io/v1alpha4\n# keep me\nnodes:\n  - role: control-plane\n  - role: worker\n";
        let spec = ClusterSpec {
            raw_config: Some(raw.to_string()),
            ..ClusterSpec::new("raw")
        };
        let invocation = KindCommandBuilder::new(RuntimeChoice::Docker)
            .create(&spec)
            .unwrap();
        assert_eq!(invocation.stdin.as_deref(), Some(raw.as_bytes()));
    }

    #[test]
    fn test_structured_fields_generate_config() {
        let spec = ClusterSpec {
            worker_nodes: Some(1),
            networking: Some(NetworkingSpec {
                pod_subnet: Some("10.244.0.0/16".to_string()),
                ..Default::default()
            }),
            ..ClusterSpec::new("dev")
        };
        let invocation = KindCommandBuilder::new(RuntimeChoice::Docker)
            .create(&spec)
            .unwrap();
        let document: KindClusterConfig =
            serde_yaml::from_slice(invocation.stdin.as_deref().unwrap()).unwrap();
        assert_eq!(document.nodes.len(), 2);
        assert_eq!(
            document.networking.unwrap().pod_subnet.as_deref(),
            Some("10.244.0.0/16")
        );
    }

    #[test]
    fn test_oversized_topology_is_rejected() {
        let mut spec = ClusterSpec::new("dev");
        spec.worker_nodes = Some(u32::MAX);
        let err = KindCommandBuilder::new(RuntimeChoice::Docker)
            .create(&spec)
            .unwrap_err();
        assert!(matches!(err, KindError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_read_and_delete_commands() {
        let builder = KindCommandBuilder::new(RuntimeChoice::Docker).with_binary("/opt/kind");
        let spec = ClusterSpec::new("dev");

        let list = builder.build(&spec, KindOperation::ListClusters).unwrap();
        assert_eq!(list.program, "/opt/kind");
        assert_eq!(list.args, vec!["get", "clusters"]);
        assert!(list.stdin.is_none());

        let kubeconfig = builder.build(&spec, KindOperation::GetKubeconfig).unwrap();
        assert_eq!(kubeconfig.args, vec!["get", "kubeconfig", "--name", "dev"]);

        let delete = builder.build(&spec, KindOperation::Delete).unwrap();
        assert_eq!(delete.args, vec!["delete", "cluster", "--name", "dev"]);
    }
}
