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

/// Executables
pub const KIND_BINARY: &str = "kind";
pub const RUNTIME_DOCKER: &str = "docker";
pub const RUNTIME_PODMAN: &str = "podman";

/// Environment variable kind reads to pick the node provider
pub const KIND_PROVIDER_ENV: &str = "KIND_EXPERIMENTAL_PROVIDER";

/// Kind configuration document
pub const KIND_CONFIG_KIND: &str = "Cluster";
pub const KIND_CONFIG_API_VERSION: &str = "kind.x-k8s.io/v1alpha4";
pub const NODE_ROLE_CONTROL_PLANE: &str = "control-plane";
pub const NODE_ROLE_WORKER: &str = "worker";

/// Reads the config document from standard input
pub const STDIN_CONFIG_PATH: &str = "-";

/// Kubeconfig context prefix kind uses for its clusters
pub const KUBECONFIG_CONTEXT_PREFIX: &str = "kind-";

/// Operation timeouts in seconds
pub const DEFAULT_CREATE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

/// Read retry policy
pub const DEFAULT_READ_RETRIES: usize = 3;
pub const DEFAULT_READ_RETRY_MIN_DELAY_MS: u64 = 500;

/// Cluster names become container hostnames, so they follow DNS label rules
pub const MAX_CLUSTER_NAME_LEN: usize = 63;

/// Every node is a container on the local host
pub const MAX_NODES: u32 = 100;

/// Config file names
pub const DEFAULT_PROVIDER_CONFIG_FILE: &str = "kind-kube.toml";
