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

//! Cluster resource domain

pub mod descriptor;
pub mod plan;
pub mod spec;
pub mod state;
pub mod validator;

pub use self::descriptor::{ApplyOutcome, KindClusterDescriptor};
pub use self::plan::{changed_fields, plan_change, ChangePlan, SpecField, IN_PLACE_FIELDS};
pub use self::spec::{ClusterSpec, IpFamily, NetworkingSpec};
pub use self::state::{ClusterPhase, ClusterState, Kubeconfig, OperationResult};
pub use self::validator::{is_valid_cluster_name, ClusterSpecValidator};
