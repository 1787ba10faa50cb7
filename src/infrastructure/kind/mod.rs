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

//! Everything that knows about the kind command line

pub mod command;
pub mod config;
pub mod parser;

pub use self::command::{build_command, KindCommandBuilder, KindOperation};
pub use self::config::{KindClusterConfig, KindNetworking, KindNode};
pub use self::parser::{
    classify_failure, parse_cluster_list, parse_kubeconfig, summarize_kubeconfig,
    KubeconfigSummary,
};
