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

use async_trait::async_trait;
use kind_kube::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const CI_KUBECONFIG: &str = r#"apiVersion: v1
clusters:
- cluster:
    certificate-authority-data: c2VjcmV0LWNh
    server: https://127.0.0.1:43117
  name: kind-ci-test
contexts:
- context:
    cluster: kind-ci-test
    user: kind-ci-test
  name: kind-ci-test
current-context: kind-ci-test
kind: Config
preferences: {}
users:
- name: kind-ci-test
  user:
    client-certificate-data: c2VjcmV0LWNlcnQ=
    client-key-data: c2VjcmV0LWtleQ==
"#;

/// Replays queued outputs and records every invocation it is handed.
#[derive(Default)]
struct ScriptedExecutor {
    responses: Mutex<VecDeque<ProcessOutput>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedExecutor {
    fn new(responses: Vec<ProcessOutput>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    fn argv(&self) -> Vec<Vec<String>> {
        self.calls().into_iter().map(|call| call.args).collect()
    }
}

#[async_trait]
impl ProcessExecutor for ScriptedExecutor {
    async fn run(
        &self,
        invocation: &Invocation,
        _timeout: Duration,
        _cancel: &CancellationToken,
    ) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| failed(1, "unexpected invocation")))
    }
}

fn ok(stdout: &str) -> ProcessOutput {
    ProcessOutput {
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
        exit_code: 0,
    }
}

fn failed(exit_code: i32, stderr: &str) -> ProcessOutput {
    ProcessOutput {
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
        exit_code,
    }
}

fn test_config() -> ProviderConfig {
    let mut config = ProviderConfig::default();
    config.read_retry.min_delay_ms = 1;
    config
}

fn descriptor(runtime: RuntimeChoice, executor: Arc<ScriptedExecutor>) -> KindClusterDescriptor {
    KindClusterDescriptor::with_executor(runtime, &test_config(), executor)
}

fn args(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[tokio::test]
async fn test_create_then_read_ci_cluster() {
    let executor = ScriptedExecutor::new(vec![
        ok(""),
        ok("ci-test\n"),
        ok(CI_KUBECONFIG),
    ]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor.clone());
    let cancel = CancellationToken::new();

    let state = descriptor
        .create_cluster(&ClusterSpec::new("ci-test"), &cancel)
        .await
        .unwrap();

    assert!(state.exists);
    assert_eq!(state.phase, ClusterPhase::Present);
    assert!(state.context.as_deref().unwrap().contains("ci-test"));
    assert_eq!(state.server.as_deref(), Some("https://127.0.0.1:43117"));
    assert!(state.kubeconfig.as_ref().unwrap().expose().contains("kind-ci-test"));

    let calls = executor.calls();
    assert_eq!(
        executor.argv(),
        vec![
            args(&["create", "cluster", "--name", "ci-test", "--config", "-"]),
            args(&["get", "clusters"]),
            args(&["get", "kubeconfig", "--name", "ci-test"]),
        ]
    );
    let stdin = String::from_utf8(calls[0].stdin.clone().unwrap()).unwrap();
    assert!(stdin.contains("kind: Cluster"));
    assert!(stdin.contains("role: control-plane"));
    for call in &calls {
        assert!(call
            .env
            .contains(&("KIND_EXPERIMENTAL_PROVIDER".to_string(), "docker".to_string())));
    }
}

#[tokio::test]
async fn test_podman_runtime_is_threaded_through() {
    let executor = ScriptedExecutor::new(vec![ok("")]);
    let descriptor = descriptor(RuntimeChoice::Podman, executor.clone());

    descriptor
        .delete_cluster("dev", &CancellationToken::new())
        .await
        .unwrap();

    let calls = executor.calls();
    assert_eq!(calls[0].args, args(&["delete", "cluster", "--name", "dev"]));
    assert!(calls[0]
        .env
        .contains(&("KIND_EXPERIMENTAL_PROVIDER".to_string(), "podman".to_string())));
}

#[tokio::test]
async fn test_existing_cluster_is_not_adopted() {
    let executor = ScriptedExecutor::new(vec![
        ok(""),
        ok("ci-test\n"),
        ok(CI_KUBECONFIG),
        failed(
            1,
            "ERROR: failed to create cluster: node(s) already exist for a cluster with the name \"ci-test\"",
        ),
        ok("ci-test\n"),
        ok(CI_KUBECONFIG),
    ]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor.clone());
    let cancel = CancellationToken::new();
    let spec = ClusterSpec::new("ci-test");

    let created = descriptor.create_cluster(&spec, &cancel).await.unwrap();

    let err = descriptor.create_cluster(&spec, &cancel).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert!(err.raw_output().unwrap().contains("already exist"));
    // The failed create issued nothing after its own invocation.
    assert_eq!(executor.calls().len(), 4);

    let observed = descriptor
        .read_cluster("ci-test", &cancel)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(observed.phase, ClusterPhase::Present);
    assert_eq!(observed.context, created.context);
    assert_eq!(observed.server, created.server);
    assert_eq!(observed.kubeconfig, created.kubeconfig);
    assert!(executor.argv().iter().all(|argv| argv[0] != "delete"));
}

#[tokio::test]
async fn test_create_reports_unreachable_runtime() {
    let executor = ScriptedExecutor::new(vec![failed(
        1,
        "ERROR: failed to create cluster: Cannot connect to the Docker daemon at unix:///var/run/docker.sock. Is the docker daemon running?",
    )]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor);

    let err = descriptor
        .create_cluster(&ClusterSpec::new("dev"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RuntimeUnavailable);
    let diagnostic = Diagnostic::from_error("Create Cluster", &err);
    assert_eq!(diagnostic.summary, "Container Runtime Unavailable");
    assert!(diagnostic.detail.contains("docker daemon running"));
}

#[tokio::test]
async fn test_invalid_spec_never_runs_kind() {
    let executor = ScriptedExecutor::new(vec![]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor.clone());

    let err = descriptor
        .create_cluster(&ClusterSpec::new("Bad_Name"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let executor = ScriptedExecutor::new(vec![
        ok(""),
        failed(1, "ERROR: unknown cluster \"ci-test\""),
    ]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor.clone());
    let cancel = CancellationToken::new();

    descriptor.delete_cluster("ci-test", &cancel).await.unwrap();
    descriptor.delete_cluster("ci-test", &cancel).await.unwrap();
    assert_eq!(executor.calls().len(), 2);
}

#[tokio::test]
async fn test_read_missing_cluster_is_absent() {
    let executor = ScriptedExecutor::new(vec![
        ok("other\n"),
        ok("No kind clusters found.\n"),
    ]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor.clone());
    let cancel = CancellationToken::new();

    assert!(descriptor.read_cluster("ci-test", &cancel).await.unwrap().is_none());
    let result = descriptor.observe("ci-test", &cancel).await;
    assert!(matches!(result, OperationResult::NotFound));
    assert_eq!(result.phase(), ClusterPhase::Absent);
    // The kubeconfig is never requested for an unlisted cluster.
    assert_eq!(executor.calls().len(), 2);
}

#[tokio::test]
async fn test_read_retries_transient_failures() {
    let executor = ScriptedExecutor::new(vec![
        failed(1, "boom"),
        ok("ci-test\n"),
        ok(CI_KUBECONFIG),
    ]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor.clone());

    let state = descriptor
        .read_cluster("ci-test", &CancellationToken::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state.name, "ci-test");
    assert_eq!(executor.calls().len(), 3);
}

#[tokio::test]
async fn test_empty_kubeconfig_is_an_error() {
    let executor = ScriptedExecutor::new(vec![ok("ci-test\n"), ok("   \n")]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor);

    let err = descriptor
        .read_cluster("ci-test", &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEmptyOutput);
}

#[tokio::test]
async fn test_rename_replaces_cluster() {
    let executor = ScriptedExecutor::new(vec![
        ok(""),
        ok(""),
        ok("ci-test-2\n"),
        ok(CI_KUBECONFIG),
    ]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor.clone());

    let prior = ClusterSpec::new("ci-test");
    let desired = ClusterSpec::new("ci-test-2");
    assert!(plan_change(&prior, &desired).requires_replace());

    let outcome = descriptor
        .apply(Some(&prior), Some(&desired), &CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        ApplyOutcome::Replaced { fields, state } => {
            assert_eq!(fields, vec![SpecField::Name]);
            assert_eq!(state.name, "ci-test-2");
        }
        other => panic!("expected a replace, got {:?}", other),
    }

    assert_eq!(
        executor.argv(),
        vec![
            args(&["delete", "cluster", "--name", "ci-test"]),
            args(&["create", "cluster", "--name", "ci-test-2", "--config", "-"]),
            args(&["get", "clusters"]),
            args(&["get", "kubeconfig", "--name", "ci-test-2"]),
        ]
    );
}

#[tokio::test]
async fn test_kubeconfig_path_updates_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kube").join("config");

    let executor = ScriptedExecutor::new(vec![ok("ci-test\n"), ok(CI_KUBECONFIG)]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor.clone());

    let prior = ClusterSpec::new("ci-test");
    let mut desired = ClusterSpec::new("ci-test");
    desired.kubeconfig_path = Some(path.clone());

    let outcome = descriptor
        .apply(Some(&prior), Some(&desired), &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(outcome, ApplyOutcome::UpdatedInPlace { .. }));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), CI_KUBECONFIG);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
    // Nothing was created or deleted.
    assert!(executor
        .argv()
        .iter()
        .all(|argv| argv[0] == "get"));
}

#[tokio::test]
async fn test_unchanged_spec_recreates_cluster_removed_out_of_band() {
    let executor = ScriptedExecutor::new(vec![
        ok(""),
        ok(""),
        ok("ci-test\n"),
        ok(CI_KUBECONFIG),
    ]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor.clone());
    let spec = ClusterSpec::new("ci-test");

    let outcome = descriptor
        .apply(Some(&spec), Some(&spec), &CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        ApplyOutcome::Recreated { fields, state } => {
            assert!(fields.is_empty());
            assert_eq!(state.name, "ci-test");
            assert!(state.exists);
        }
        other => panic!("expected a recreate, got {:?}", other),
    }
    assert_eq!(
        executor.argv(),
        vec![
            args(&["get", "clusters"]),
            args(&["create", "cluster", "--name", "ci-test", "--config", "-"]),
            args(&["get", "clusters"]),
            args(&["get", "kubeconfig", "--name", "ci-test"]),
        ]
    );
}

#[tokio::test]
async fn test_in_place_change_recreates_cluster_removed_out_of_band() {
    let executor = ScriptedExecutor::new(vec![
        ok("No kind clusters found.\n"),
        ok(""),
        ok("ci-test\n"),
        ok(CI_KUBECONFIG),
    ]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor);

    let prior = ClusterSpec::new("ci-test");
    let mut desired = ClusterSpec::new("ci-test");
    desired.wait_for_ready = Some(60);

    let outcome = descriptor
        .apply(Some(&prior), Some(&desired), &CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        ApplyOutcome::Recreated { fields, .. } => {
            assert_eq!(fields, vec![SpecField::WaitForReady]);
        }
        other => panic!("expected a recreate, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unchanged_spec_with_present_cluster_is_a_no_op() {
    let executor = ScriptedExecutor::new(vec![ok("ci-test\n"), ok(CI_KUBECONFIG)]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor.clone());
    let spec = ClusterSpec::new("ci-test");

    let outcome = descriptor
        .apply(Some(&spec), Some(&spec), &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(outcome, ApplyOutcome::Unchanged(_)));
    assert!(executor.argv().iter().all(|argv| argv[0] == "get"));
}

#[tokio::test]
async fn test_apply_delete_and_nothing() {
    let executor = ScriptedExecutor::new(vec![ok("")]);
    let descriptor = descriptor(RuntimeChoice::Docker, executor);
    let cancel = CancellationToken::new();
    let spec = ClusterSpec::new("dev");

    let outcome = descriptor.apply(Some(&spec), None, &cancel).await.unwrap();
    assert!(matches!(outcome, ApplyOutcome::Deleted { ref name } if name == "dev"));

    let err = descriptor.apply(None, None, &cancel).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
}
