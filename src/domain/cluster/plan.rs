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

//! Diffing a prior spec against a desired one.
//!
//! kind has no way to change a running cluster, so almost every difference
//! means destroying and recreating it. Only fields on [`IN_PLACE_FIELDS`]
//! are handled without touching the cluster.

use crate::domain::cluster::spec::ClusterSpec;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SpecField {
    Name,
    NodeImage,
    ControlPlaneNodes,
    WorkerNodes,
    Networking,
    RawConfig,
    WaitForReady,
    KubeconfigPath,
}

/// Fields that can change without recreating the cluster.
pub const IN_PLACE_FIELDS: &[SpecField] = &[SpecField::WaitForReady, SpecField::KubeconfigPath];

impl SpecField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecField::Name => "name",
            SpecField::NodeImage => "node_image",
            SpecField::ControlPlaneNodes => "control_plane_nodes",
            SpecField::WorkerNodes => "worker_nodes",
            SpecField::Networking => "networking",
            SpecField::RawConfig => "raw_config",
            SpecField::WaitForReady => "wait_for_ready",
            SpecField::KubeconfigPath => "kubeconfig_path",
        }
    }

    pub fn supports_in_place(&self) -> bool {
        IN_PLACE_FIELDS.contains(self)
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChangePlan {
    NoOp,
    UpdateInPlace { fields: Vec<SpecField> },
    Replace { fields: Vec<SpecField> },
}

impl ChangePlan {
    pub fn fields(&self) -> &[SpecField] {
        match self {
            ChangePlan::NoOp => &[],
            ChangePlan::UpdateInPlace { fields } | ChangePlan::Replace { fields } => fields,
        }
    }

    pub fn requires_replace(&self) -> bool {
        matches!(self, ChangePlan::Replace { .. })
    }
}

impl fmt::Display for ChangePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .fields()
            .iter()
            .map(SpecField::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        match self {
            ChangePlan::NoOp => f.write_str("no changes"),
            ChangePlan::UpdateInPlace { .. } => write!(f, "update in place ({})", fields),
            ChangePlan::Replace { .. } => write!(f, "replace ({})", fields),
        }
    }
}

/// Lists the fields that differ, treating empty strings as unset.
pub fn changed_fields(prior: &ClusterSpec, desired: &ClusterSpec) -> Vec<SpecField> {
    let mut fields = Vec::new();

    if prior.name != desired.name {
        fields.push(SpecField::Name);
    }
    if prior.node_image() != desired.node_image() {
        fields.push(SpecField::NodeImage);
    }
    if prior.control_plane_nodes.unwrap_or(1) != desired.control_plane_nodes.unwrap_or(1) {
        fields.push(SpecField::ControlPlaneNodes);
    }
    if prior.worker_nodes.unwrap_or(0) != desired.worker_nodes.unwrap_or(0) {
        fields.push(SpecField::WorkerNodes);
    }
    if prior.networking() != desired.networking() {
        fields.push(SpecField::Networking);
    }
    if prior.raw_config() != desired.raw_config() {
        fields.push(SpecField::RawConfig);
    }
    if prior.wait_for_ready != desired.wait_for_ready {
        fields.push(SpecField::WaitForReady);
    }
    if prior.kubeconfig_path != desired.kubeconfig_path {
        fields.push(SpecField::KubeconfigPath);
    }

    fields
}

pub fn plan_change(prior: &ClusterSpec, desired: &ClusterSpec) -> ChangePlan {
    let fields = changed_fields(prior, desired);
    if fields.is_empty() {
        ChangePlan::NoOp
    } else if fields.iter().all(SpecField::supports_in_place) {
        ChangePlan::UpdateInPlace { fields }
    } else {
        ChangePlan::Replace { fields }
    }
}
