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

use crate::shared::error::KindError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Desired state of one kind cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterSpec {
    /// Cluster name, immutable once the cluster exists
    pub name: String,
    /// Node image such as `kindest/node:v1.30.0`; kind's default when unset
    pub node_image: Option<String>,
    pub control_plane_nodes: Option<u32>,
    pub worker_nodes: Option<u32>,
    pub networking: Option<NetworkingSpec>,
    /// Complete kind `Cluster` document, passed through verbatim
    pub raw_config: Option<String>,
    /// Seconds `kind create cluster --wait` blocks for the control plane
    pub wait_for_ready: Option<u64>,
    /// Where the kubeconfig is written after create
    pub kubeconfig_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkingSpec {
    pub ip_family: Option<IpFamily>,
    pub api_server_address: Option<String>,
    pub api_server_port: Option<u16>,
    pub pod_subnet: Option<String>,
    pub service_subnet: Option<String>,
    pub disable_default_cni: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    Ipv4,
    Ipv6,
    Dual,
}

impl ClusterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn node_image(&self) -> Option<&str> {
        non_empty(self.node_image.as_deref())
    }

    pub fn raw_config(&self) -> Option<&str> {
        non_empty(self.raw_config.as_deref())
    }

    pub fn networking(&self) -> Option<&NetworkingSpec> {
        self.networking.as_ref().filter(|n| !n.is_empty())
    }

    /// Whether any field that shapes the generated config document is set.
    pub fn has_structured_fields(&self) -> bool {
        self.control_plane_nodes.is_some()
            || self.worker_nodes.is_some()
            || self.networking().is_some()
    }

    /// Loads a spec from `.toml`, `.yaml`/`.yml` or `.json`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, KindError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            KindError::InvalidConfiguration(format!(
                "Failed to read cluster spec '{}': {}",
                path.display(),
                e
            ))
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let spec = match extension {
            "toml" => toml::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            other => {
                return Err(KindError::InvalidConfiguration(format!(
                    "Unsupported cluster spec format '{}' for {}",
                    other,
                    path.display()
                )))
            }
        };
        Ok(spec)
    }
}

impl NetworkingSpec {
    pub fn is_empty(&self) -> bool {
        self == &NetworkingSpec::default()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
