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

// Core modules
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export commonly used types
pub use domain::cluster::{
    plan_change, ApplyOutcome, ChangePlan, ClusterPhase, ClusterSpec, ClusterSpecValidator,
    ClusterState, KindClusterDescriptor, Kubeconfig, NetworkingSpec, OperationResult, SpecField,
};
pub use domain::config::{ProviderConfig, RuntimeChoice};
pub use infrastructure::process::{
    ExecutableLookup, Invocation, ProcessExecutor, ProcessOutput, SearchPathLookup,
    TokioProcessExecutor,
};
pub use shared::{Diagnostic, ErrorKind, KindError, Result};

// Re-export builders for internal use
#[doc(hidden)]
pub use infrastructure::kind::{KindClusterConfig, KindCommandBuilder, KindOperation};
