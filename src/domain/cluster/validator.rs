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

use crate::domain::cluster::spec::{ClusterSpec, IpFamily, NetworkingSpec};
use crate::infrastructure::constants::{KIND_CONFIG_KIND, MAX_CLUSTER_NAME_LEN, MAX_NODES};
use crate::shared::error::KindError;
use std::net::IpAddr;

/// Checks a desired spec before any process is spawned.
pub struct ClusterSpecValidator;

impl ClusterSpecValidator {
    pub fn validate(spec: &ClusterSpec) -> Result<(), KindError> {
        Self::validate_name(&spec.name)?;

        if let Some(image) = spec.node_image() {
            if image.chars().any(char::is_whitespace) {
                return Err(KindError::InvalidConfiguration(format!(
                    "Invalid node_image '{}': must not contain whitespace",
                    image
                )));
            }
        }

        Self::validate_node_counts(spec)?;

        if let Some(networking) = spec.networking() {
            Self::validate_networking(networking)?;
        }

        if let Some(raw) = spec.raw_config() {
            if spec.has_structured_fields() {
                return Err(KindError::InvalidConfiguration(
                    "raw_config cannot be combined with control_plane_nodes, worker_nodes or \
                     networking; describe the topology inside raw_config instead"
                        .to_string(),
                ));
            }
            Self::validate_raw_config(&spec.name, raw)?;
        }

        Ok(())
    }

    /// At least one control plane, and at most `MAX_NODES` nodes in total.
    pub fn validate_node_counts(spec: &ClusterSpec) -> Result<(), KindError> {
        let control_planes = spec.control_plane_nodes.unwrap_or(1);
        let workers = spec.worker_nodes.unwrap_or(0);

        if control_planes == 0 {
            return Err(KindError::InvalidConfiguration(
                "control_plane_nodes must be > 0".to_string(),
            ));
        }

        let total = u64::from(control_planes) + u64::from(workers);
        if total > u64::from(MAX_NODES) {
            return Err(KindError::InvalidConfiguration(format!(
                "Cluster would have {} nodes ({} control plane, {} worker); at most {} allowed",
                total, control_planes, workers, MAX_NODES
            )));
        }
        Ok(())
    }

    pub fn validate_name(name: &str) -> Result<(), KindError> {
        if !is_valid_cluster_name(name) {
            return Err(KindError::InvalidConfiguration(format!(
                "Invalid cluster name '{}': must be 1-{} lowercase alphanumeric characters or '-', \
                 starting and ending with an alphanumeric character",
                name, MAX_CLUSTER_NAME_LEN
            )));
        }
        Ok(())
    }

    fn validate_networking(networking: &NetworkingSpec) -> Result<(), KindError> {
        if let Some(address) = networking.api_server_address.as_deref() {
            address.parse::<IpAddr>().map_err(|_| {
                KindError::InvalidConfiguration(format!(
                    "Invalid api_server_address '{}': must be an IP address",
                    address
                ))
            })?;
        }

        let dual = networking.ip_family == Some(IpFamily::Dual);
        for (field, value) in [
            ("pod_subnet", networking.pod_subnet.as_deref()),
            ("service_subnet", networking.service_subnet.as_deref()),
        ] {
            if let Some(value) = value {
                validate_subnet(field, value, dual)?;
            }
        }

        Ok(())
    }

    fn validate_raw_config(name: &str, raw: &str) -> Result<(), KindError> {
        let document: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|e| {
            KindError::InvalidConfiguration(format!("raw_config is not valid YAML: {}", e))
        })?;

        let mapping = document.as_mapping().ok_or_else(|| {
            KindError::InvalidConfiguration("raw_config must be a YAML mapping".to_string())
        })?;

        if let Some(kind) = mapping.get("kind").and_then(|v| v.as_str()) {
            if kind != KIND_CONFIG_KIND {
                return Err(KindError::InvalidConfiguration(format!(
                    "raw_config has kind '{}', expected '{}'",
                    kind, KIND_CONFIG_KIND
                )));
            }
        }

        if let Some(raw_name) = mapping.get("name").and_then(|v| v.as_str()) {
            if raw_name != name {
                return Err(KindError::InvalidConfiguration(format!(
                    "raw_config names cluster '{}' but the resource is named '{}'",
                    raw_name, name
                )));
            }
        }

        Ok(())
    }
}

/// Cluster names end up in container hostnames, so they must be DNS labels.
pub fn is_valid_cluster_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_CLUSTER_NAME_LEN {
        return false;
    }

    if !name.chars().next().unwrap_or(' ').is_ascii_alphanumeric() {
        return false;
    }
    if !name.chars().last().unwrap_or(' ').is_ascii_alphanumeric() {
        return false;
    }

    name.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn validate_subnet(field: &str, value: &str, dual: bool) -> Result<(), KindError> {
    // Dual-stack subnets are given as "v4cidr,v6cidr"
    let parts: Vec<&str> = if dual {
        value.split(',').map(str::trim).collect()
    } else {
        vec![value]
    };

    for part in parts {
        if !is_valid_cidr(part) {
            return Err(KindError::InvalidConfiguration(format!(
                "Invalid {} '{}': expected CIDR notation such as 10.244.0.0/16",
                field, value
            )));
        }
    }
    Ok(())
}

fn is_valid_cidr(value: &str) -> bool {
    let Some((address, prefix)) = value.split_once('/') else {
        return false;
    };
    let (Ok(address), Ok(prefix)) = (address.parse::<IpAddr>(), prefix.parse::<u8>()) else {
        return false;
    };
    match address {
        IpAddr::V4(_) => prefix <= 32,
        IpAddr::V6(_) => prefix <= 128,
    }
}
