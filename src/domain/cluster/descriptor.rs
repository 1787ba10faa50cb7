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

//! Lifecycle of a single kind cluster resource.
//!
//! `KindClusterDescriptor` turns desired specs into kind invocations and
//! classifies the results. It keeps no cluster state between calls: every
//! observed [`ClusterState`] comes from a fresh `kind get` round-trip, so one
//! descriptor can serve concurrent reconciliations of different clusters.
//!
//! Create and delete run once; only reads are retried, since they have no
//! side effects.

use crate::domain::cluster::plan::{plan_change, ChangePlan, SpecField};
use crate::domain::cluster::spec::ClusterSpec;
use crate::domain::cluster::state::{ClusterPhase, ClusterState, Kubeconfig, OperationResult};
use crate::domain::cluster::validator::ClusterSpecValidator;
use crate::domain::config::{ProviderConfig, RetryConfig, RuntimeChoice, TimeoutConfig};
use crate::infrastructure::constants::KUBECONFIG_CONTEXT_PREFIX;
use crate::infrastructure::kind::{
    classify_failure, parse_cluster_list, parse_kubeconfig, summarize_kubeconfig,
    KindCommandBuilder,
};
use crate::infrastructure::process::{
    Invocation, ProcessExecutor, ProcessOutput, SearchPathLookup, TokioProcessExecutor,
};
use crate::shared::error::{ErrorKind, KindError, Result};
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What [`KindClusterDescriptor::apply`] did.
#[derive(Debug)]
pub enum ApplyOutcome {
    Created(ClusterState),
    Unchanged(ClusterState),
    UpdatedInPlace {
        fields: Vec<SpecField>,
        state: ClusterState,
    },
    Replaced {
        fields: Vec<SpecField>,
        state: ClusterState,
    },
    /// The plan needed no replace, but the cluster had been removed out of
    /// band and was created again.
    Recreated {
        fields: Vec<SpecField>,
        state: ClusterState,
    },
    Deleted {
        name: String,
    },
}

impl ApplyOutcome {
    pub fn state(&self) -> Option<&ClusterState> {
        match self {
            ApplyOutcome::Created(state) | ApplyOutcome::Unchanged(state) => Some(state),
            ApplyOutcome::UpdatedInPlace { state, .. }
            | ApplyOutcome::Replaced { state, .. }
            | ApplyOutcome::Recreated { state, .. } => Some(state),
            ApplyOutcome::Deleted { .. } => None,
        }
    }

    pub fn into_state(self) -> Option<ClusterState> {
        match self {
            ApplyOutcome::Created(state) | ApplyOutcome::Unchanged(state) => Some(state),
            ApplyOutcome::UpdatedInPlace { state, .. }
            | ApplyOutcome::Replaced { state, .. }
            | ApplyOutcome::Recreated { state, .. } => Some(state),
            ApplyOutcome::Deleted { .. } => None,
        }
    }
}

pub struct KindClusterDescriptor {
    executor: Arc<dyn ProcessExecutor>,
    commands: KindCommandBuilder,
    timeouts: TimeoutConfig,
    read_retry: RetryConfig,
}

impl KindClusterDescriptor {
    pub fn new(runtime: RuntimeChoice, config: &ProviderConfig) -> Self {
        Self::with_executor(runtime, config, Arc::new(TokioProcessExecutor::new()))
    }

    /// Validates the config and resolves the runtime from it, probing the
    /// search path when none is configured.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let runtime = config.resolve_runtime(&SearchPathLookup::from_env())?;
        Ok(Self::new(runtime, config))
    }

    pub fn with_executor(
        runtime: RuntimeChoice,
        config: &ProviderConfig,
        executor: Arc<dyn ProcessExecutor>,
    ) -> Self {
        Self {
            executor,
            commands: KindCommandBuilder::new(runtime).with_binary(config.kind_binary.clone()),
            timeouts: config.timeouts.clone(),
            read_retry: config.read_retry.clone(),
        }
    }

    pub fn runtime(&self) -> RuntimeChoice {
        self.commands.runtime()
    }

    /// Creates the cluster and reads it back so the returned state carries a
    /// kubeconfig. An existing cluster with the same name is never adopted.
    pub async fn create_cluster(
        &self,
        spec: &ClusterSpec,
        cancel: &CancellationToken,
    ) -> Result<ClusterState> {
        ClusterSpecValidator::validate(spec)?;
        let invocation = self.commands.create(spec)?;

        transition(&spec.name, ClusterPhase::Absent, ClusterPhase::Creating);
        let output = self
            .execute(&invocation, self.timeouts.create(), cancel)
            .await
            .map_err(|e| fail(&spec.name, ClusterPhase::Creating, e))?;

        if !output.success() {
            let err = classify_failure(&spec.name, &invocation.command_line(), &output);
            if err.kind() == ErrorKind::AlreadyExists {
                warn!(
                    cluster = %spec.name,
                    "A cluster with this name already exists and will not be adopted"
                );
            }
            return Err(fail(&spec.name, ClusterPhase::Creating, err));
        }
        transition(&spec.name, ClusterPhase::Creating, ClusterPhase::Present);

        let state = match self.read_cluster(&spec.name, cancel).await? {
            Some(state) => state,
            None => {
                return Err(fail(
                    &spec.name,
                    ClusterPhase::Present,
                    KindError::not_found(spec.name.as_str()),
                ))
            }
        };

        if let Some(path) = &spec.kubeconfig_path {
            export_kubeconfig(&state, path).await?;
        }

        info!(cluster = %spec.name, runtime = %self.runtime(), "Cluster created");
        Ok(state)
    }

    /// `None` means the cluster does not exist, including when it was removed
    /// outside of this tool.
    pub async fn read_cluster(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ClusterState>> {
        ClusterSpecValidator::validate_name(name)?;

        let clusters = self.list_clusters(cancel).await?;
        if !clusters.iter().any(|cluster| cluster == name) {
            warn!(cluster = %name, "Cluster not found in kind listing, reporting it as absent");
            return Ok(None);
        }

        let kubeconfig = match self
            .with_read_retry("get kubeconfig", || self.fetch_kubeconfig(name, cancel))
            .await
        {
            Ok(kubeconfig) => kubeconfig,
            // Deleted between the listing and the fetch.
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(cluster = %name, "Cluster disappeared while reading it");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let summary = summarize_kubeconfig(&kubeconfig);
        // kind always names the context after the cluster.
        let context = summary
            .context
            .or_else(|| Some(format!("{}{}", KUBECONFIG_CONTEXT_PREFIX, name)));
        Ok(Some(
            ClusterState::present(name, self.runtime(), kubeconfig)
                .with_endpoint(context, summary.server),
        ))
    }

    /// [`Self::read_cluster`] folded into an [`OperationResult`].
    pub async fn observe(&self, name: &str, cancel: &CancellationToken) -> OperationResult {
        OperationResult::from_read(self.read_cluster(name, cancel).await)
    }

    /// Moves a cluster from `prior` to `desired`. kind cannot change a running
    /// cluster, so any change outside the in-place allow-list is a delete
    /// followed by a create.
    pub async fn update_cluster(
        &self,
        prior: &ClusterSpec,
        desired: &ClusterSpec,
        cancel: &CancellationToken,
    ) -> Result<ClusterState> {
        self.reconcile(prior, desired, cancel)
            .await?
            .into_state()
            .ok_or_else(|| KindError::not_found(desired.name.as_str()))
    }

    async fn reconcile(
        &self,
        prior: &ClusterSpec,
        desired: &ClusterSpec,
        cancel: &CancellationToken,
    ) -> Result<ApplyOutcome> {
        ClusterSpecValidator::validate(desired)?;

        let plan = plan_change(prior, desired);
        debug!(cluster = %desired.name, plan = %plan, "Planned cluster update");

        if plan.requires_replace() {
            info!(
                cluster = %prior.name,
                replacement = %desired.name,
                plan = %plan,
                "Replacing cluster"
            );
            self.delete_cluster(&prior.name, cancel).await?;
            let state = self.create_cluster(desired, cancel).await?;
            return Ok(ApplyOutcome::Replaced {
                fields: plan.fields().to_vec(),
                state,
            });
        }

        let state = match self.read_cluster(&desired.name, cancel).await? {
            Some(state) => state,
            None => {
                warn!(cluster = %desired.name, "Cluster was removed out of band, recreating it");
                let state = self.create_cluster(desired, cancel).await?;
                return Ok(ApplyOutcome::Recreated {
                    fields: plan.fields().to_vec(),
                    state,
                });
            }
        };

        if plan.fields().contains(&SpecField::KubeconfigPath) {
            if let Some(path) = &desired.kubeconfig_path {
                export_kubeconfig(&state, path).await?;
            }
        }

        Ok(match plan {
            ChangePlan::UpdateInPlace { fields } => ApplyOutcome::UpdatedInPlace { fields, state },
            _ => ApplyOutcome::Unchanged(state),
        })
    }

    /// Deleting a cluster that does not exist succeeds.
    pub async fn delete_cluster(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        ClusterSpecValidator::validate_name(name)?;
        let invocation = self.commands.delete(name);

        transition(name, ClusterPhase::Present, ClusterPhase::Deleting);
        let output = self
            .execute(&invocation, self.timeouts.delete(), cancel)
            .await
            .map_err(|e| fail(name, ClusterPhase::Deleting, e))?;

        if !output.success() {
            match classify_failure(name, &invocation.command_line(), &output) {
                KindError::NotFound { .. } => {
                    info!(cluster = %name, "Cluster already absent");
                }
                err => return Err(fail(name, ClusterPhase::Deleting, err)),
            }
        }

        transition(name, ClusterPhase::Deleting, ClusterPhase::Absent);
        Ok(())
    }

    /// Names of every cluster kind knows about for this runtime.
    pub async fn list_clusters(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        self.with_read_retry("get clusters", || self.fetch_cluster_names(cancel))
            .await
    }

    /// Drives a resource from `prior` to `desired`; `None` stands for "no
    /// cluster".
    pub async fn apply(
        &self,
        prior: Option<&ClusterSpec>,
        desired: Option<&ClusterSpec>,
        cancel: &CancellationToken,
    ) -> Result<ApplyOutcome> {
        match (prior, desired) {
            (None, Some(desired)) => Ok(ApplyOutcome::Created(
                self.create_cluster(desired, cancel).await?,
            )),
            (Some(prior), None) => {
                self.delete_cluster(&prior.name, cancel).await?;
                Ok(ApplyOutcome::Deleted {
                    name: prior.name.clone(),
                })
            }
            (Some(prior), Some(desired)) => self.reconcile(prior, desired, cancel).await,
            (None, None) => Err(KindError::invalid_configuration(
                "apply needs a prior spec, a desired spec, or both",
            )),
        }
    }

    async fn fetch_cluster_names(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        let invocation = self.commands.list_clusters();
        let output = self
            .execute(&invocation, self.timeouts.read(), cancel)
            .await?;
        if !output.success() {
            return Err(classify_failure("", &invocation.command_line(), &output));
        }
        Ok(parse_cluster_list(&output.stdout_str()))
    }

    async fn fetch_kubeconfig(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Kubeconfig> {
        let invocation = self.commands.get_kubeconfig(name);
        let output = self
            .execute(&invocation, self.timeouts.read(), cancel)
            .await?;
        if !output.success() {
            return Err(classify_failure(name, &invocation.command_line(), &output));
        }
        parse_kubeconfig(&invocation.command_line(), &output)
    }

    async fn with_read_retry<T, F, Fut>(&self, operation: &str, read: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.read_retry.min_delay())
            .with_max_times(self.read_retry.max_times);

        read.retry(&backoff)
            .when(|err: &KindError| err.kind().is_transient())
            .notify(|err: &KindError, delay: Duration| {
                warn!(
                    operation,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "Read failed, retrying"
                );
            })
            .await
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput> {
        self.executor.run(invocation, timeout, cancel).await
    }
}

fn transition(name: &str, from: ClusterPhase, to: ClusterPhase) {
    info!(cluster = %name, from = %from, to = %to, "Cluster phase transition");
}

fn fail(name: &str, from: ClusterPhase, err: KindError) -> KindError {
    warn!(
        cluster = %name,
        from = %from,
        to = %ClusterPhase::Failed,
        kind = %err.kind(),
        error = %err,
        "Cluster operation failed"
    );
    err
}

/// Writes the state's kubeconfig with owner-only permissions.
pub(crate) async fn export_kubeconfig(state: &ClusterState, path: &Path) -> Result<()> {
    let kubeconfig = state
        .kubeconfig
        .as_ref()
        .ok_or_else(|| KindError::UnexpectedEmptyOutput {
            command: format!("kubeconfig export for '{}'", state.name),
        })?;
    kubeconfig.write_to(path).await?;

    info!(cluster = %state.name, path = %path.display(), "Kubeconfig exported");
    Ok(())
}
