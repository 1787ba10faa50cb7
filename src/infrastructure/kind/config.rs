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

//! Typed model of the `kind.x-k8s.io/v1alpha4` Cluster document.

use crate::domain::cluster::{ClusterSpec, IpFamily, NetworkingSpec};
use crate::infrastructure::constants::{
    KIND_CONFIG_API_VERSION, KIND_CONFIG_KIND, NODE_ROLE_CONTROL_PLANE, NODE_ROLE_WORKER,
};
use crate::shared::error::KindError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindClusterConfig {
    pub kind: String,
    pub api_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networking: Option<KindNetworking>,
    #[serde(default)]
    pub nodes: Vec<KindNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindNode {
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindNetworking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_subnet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_subnet: Option<String>,
    #[serde(
        default,
        rename = "disableDefaultCNI",
        skip_serializing_if = "Option::is_none"
    )]
    pub disable_default_cni: Option<bool>,
}

impl KindClusterConfig {
    /// One control-plane node and no workers unless `ClusterSpec` sets counts.
    pub fn from_spec(spec: &ClusterSpec) -> Self {
        let control_planes = spec.control_plane_nodes.unwrap_or(1);
        let workers = spec.worker_nodes.unwrap_or(0);

        let nodes = std::iter::repeat(NODE_ROLE_CONTROL_PLANE)
            .take(control_planes as usize)
            .chain(std::iter::repeat(NODE_ROLE_WORKER).take(workers as usize))
            .map(|role| KindNode {
                role: role.to_string(),
            })
            .collect();

        Self {
            kind: KIND_CONFIG_KIND.to_string(),
            api_version: KIND_CONFIG_API_VERSION.to_string(),
            networking: spec.networking().map(KindNetworking::from_spec),
            nodes,
        }
    }

    pub fn to_yaml(&self) -> Result<String, KindError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl KindNetworking {
    fn from_spec(networking: &NetworkingSpec) -> Self {
        Self {
            ip_family: networking.ip_family.map(|family| {
                match family {
                    IpFamily::Ipv4 => "ipv4",
                    IpFamily::Ipv6 => "ipv6",
                    IpFamily::Dual => "dual",
                }
                .to_string()
            }),
            api_server_address: networking.api_server_address.clone(),
            api_server_port: networking.api_server_port,
            pod_subnet: networking.pod_subnet.clone(),
            service_subnet: networking.service_subnet.clone(),
            disable_default_cni: networking.disable_default_cni,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let yaml = KindClusterConfig::from_spec(&ClusterSpec::new("ci-test"))
            .to_yaml()
            .unwrap();
        assert_eq!(
            yaml,
            "kind: Cluster\napiVersion: kind.x-k8s.io/v1alpha4\nnodes:\n- role: control-plane\n"
        );
    }

    #[test]
    fn test_topology() {
        let spec = ClusterSpec {
            control_plane_nodes: Some(3),
            worker_nodes: Some(2),
            ..ClusterSpec::new("ha")
        };
        let config = KindClusterConfig::from_spec(&spec);
        let roles: Vec<_> = config.nodes.iter().map(|n| n.role.as_str()).collect();
        assert_eq!(
            roles,
            vec!["control-plane", "control-plane", "control-plane", "worker", "worker"]
        );
    }

    #[test]
    fn test_networking_field_names() {
        let spec = ClusterSpec {
            networking: Some(NetworkingSpec {
                ip_family: Some(IpFamily::Ipv6),
                api_server_address: Some("127.0.0.1".to_string()),
                api_server_port: Some(6443),
                pod_subnet: Some("fd00:10:244::/56".to_string()),
                service_subnet: None,
                disable_default_cni: Some(true),
            }),
            ..ClusterSpec::new("net")
        };
        let yaml = KindClusterConfig::from_spec(&spec).to_yaml().unwrap();
        assert!(yaml.contains("ipFamily: ipv6"));
        assert!(yaml.contains("apiServerAddress: 127.0.0.1"));
        assert!(yaml.contains("apiServerPort: 6443"));
        assert!(yaml.contains("podSubnet:"));
        assert!(yaml.contains("disableDefaultCNI: true"));
        assert!(!yaml.contains("serviceSubnet"));

        let parsed: KindClusterConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, KindClusterConfig::from_spec(&spec));
    }
}
