//! Kind cluster lifecycle commands

use crate::cli::display::{table::ClusterInfo, TableRenderer};
use crate::domain::cluster::descriptor::export_kubeconfig;
use crate::domain::cluster::{plan_change, ApplyOutcome, ClusterSpec, OperationResult};
use crate::domain::config::{apply_to_provider_config, parse_dynamic_configs};
use crate::infrastructure::constants::DEFAULT_PROVIDER_CONFIG_FILE;
use crate::{Diagnostic, KindClusterDescriptor, KindError, ProviderConfig};
use clap::{Args, Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Options shared by every command that talks to kind
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// Path to the provider configuration file (TOML)
    /// If not provided, ./kind-kube.toml is used when present
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Container runtime kind should use (docker, podman)
    /// If not specified, podman then docker is looked up on PATH
    #[arg(long)]
    pub runtime: Option<String>,

    /// Dynamic configuration properties (-D key=value)
    ///
    /// Keys: provider.runtime, kind.binary, timeout.create, timeout.read,
    /// timeout.delete, read.retries, read.retry-delay-ms
    ///
    /// Example: -Dtimeout.create=900 -Dkind.binary=/usr/local/bin/kind
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

impl ProviderArgs {
    pub fn load_config(&self) -> anyhow::Result<ProviderConfig> {
        let mut config = match &self.config {
            Some(path) => ProviderConfig::from_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path.display(), e))?,
            None if Path::new(DEFAULT_PROVIDER_CONFIG_FILE).exists() => {
                ProviderConfig::from_file(DEFAULT_PROVIDER_CONFIG_FILE).map_err(|e| {
                    anyhow::anyhow!(
                        "Failed to load config {}: {}",
                        DEFAULT_PROVIDER_CONFIG_FILE,
                        e
                    )
                })?
            }
            None => ProviderConfig::default(),
        };

        if let Some(runtime) = &self.runtime {
            config.runtime = Some(runtime.clone());
        }

        if !self.properties.is_empty() {
            let overrides = parse_dynamic_configs(&self.properties)
                .map_err(|e| anyhow::anyhow!("Failed to parse -D properties: {}", e))?;
            apply_to_provider_config(&overrides, &mut config)
                .map_err(|e| anyhow::anyhow!("Failed to apply -D properties: {}", e))?;
        }

        Ok(config)
    }

    pub fn descriptor(&self) -> anyhow::Result<KindClusterDescriptor> {
        let config = self.load_config()?;
        KindClusterDescriptor::from_config(&config).map_err(|e| report("Configure Provider", &e))
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser, Debug, Clone)]
pub struct CreateCommand {
    /// Cluster spec file (TOML, YAML or JSON); flags below override its fields
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Cluster name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Node image, e.g. kindest/node:v1.30.0
    #[arg(long)]
    pub image: Option<String>,

    #[arg(long)]
    pub control_planes: Option<u32>,

    #[arg(long)]
    pub workers: Option<u32>,

    /// Seconds kind waits for the control plane to become ready
    #[arg(long, value_name = "SECONDS")]
    pub wait: Option<u64>,

    /// Also write the kubeconfig to this file
    #[arg(long, value_name = "PATH")]
    pub kubeconfig_path: Option<PathBuf>,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct GetCommand {
    /// Cluster name
    pub name: String,

    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// Cluster name
    pub name: String,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct KubeconfigCommand {
    /// Cluster name
    pub name: String,

    /// Write to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct PlanCommand {
    /// Spec the cluster was created from; omit when it does not exist yet
    #[arg(long, value_name = "PATH")]
    pub from: Option<PathBuf>,

    /// Spec the cluster should match; omit to plan a delete
    #[arg(long, value_name = "PATH")]
    pub to: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ApplyCommand {
    /// Spec the cluster was created from; omit when it does not exist yet
    #[arg(long, value_name = "PATH")]
    pub from: Option<PathBuf>,

    /// Spec the cluster should match; omit to delete it
    #[arg(long, value_name = "PATH")]
    pub to: Option<PathBuf>,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// Token cancelled on the first Ctrl-C, which kills any running kind child.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling the running kind command");
            child.cancel();
        }
    });
    token
}

fn report(operation: &str, err: &KindError) -> anyhow::Error {
    anyhow::anyhow!("{}", Diagnostic::from_error(operation, err))
}

fn load_spec(path: &Path) -> anyhow::Result<ClusterSpec> {
    ClusterSpec::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load cluster spec {}: {}", path.display(), e))
}

impl CreateCommand {
    fn build_spec(&self) -> anyhow::Result<ClusterSpec> {
        let mut spec = match (&self.file, &self.name) {
            (Some(path), _) => load_spec(path)?,
            (None, Some(name)) => ClusterSpec::new(name.clone()),
            (None, None) => anyhow::bail!("A cluster name is required (use -n/--name or -f)"),
        };

        if let Some(name) = &self.name {
            spec.name = name.clone();
        }
        if self.image.is_some() {
            spec.node_image = self.image.clone();
        }
        if self.control_planes.is_some() {
            spec.control_plane_nodes = self.control_planes;
        }
        if self.workers.is_some() {
            spec.worker_nodes = self.workers;
        }
        if self.wait.is_some() {
            spec.wait_for_ready = self.wait;
        }
        if self.kubeconfig_path.is_some() {
            spec.kubeconfig_path = self.kubeconfig_path.clone();
        }
        Ok(spec)
    }

    pub async fn execute(&self) -> anyhow::Result<()> {
        let spec = self.build_spec()?;
        let descriptor = self.provider.descriptor()?;
        let cancel = cancel_on_ctrl_c();

        println!(
            "Creating cluster {} with runtime {}...",
            spec.name,
            descriptor.runtime()
        );
        let state = descriptor
            .create_cluster(&spec, &cancel)
            .await
            .map_err(|e| report("Create Cluster", &e))?;

        println!("{}", TableRenderer::new().render_cluster_status(&state));
        println!("Cluster {} created successfully!", state.name);
        Ok(())
    }
}

impl GetCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let descriptor = self.provider.descriptor()?;
        let cancel = cancel_on_ctrl_c();

        match descriptor.observe(&self.name, &cancel).await {
            OperationResult::Success(state) => {
                match self.output {
                    OutputFormat::Table => {
                        println!("{}", TableRenderer::new().render_cluster_status(&state))
                    }
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
                }
                Ok(())
            }
            OperationResult::NotFound => {
                Err(report("Read Cluster", &KindError::not_found(self.name.as_str())))
            }
            OperationResult::Failure {
                kind,
                message,
                raw_output,
            } => {
                let mut detail = format!("[{}] {}", kind, message);
                if !raw_output.trim().is_empty() {
                    detail.push_str("\n\nkind output:\n");
                    detail.push_str(&raw_output);
                }
                anyhow::bail!("Failed To Read Cluster: {}", detail)
            }
        }
    }
}

impl ListCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let descriptor = self.provider.descriptor()?;
        let cancel = cancel_on_ctrl_c();

        let names = descriptor
            .list_clusters(&cancel)
            .await
            .map_err(|e| report("List Clusters", &e))?;

        let results = futures::future::join_all(
            names.iter().map(|name| descriptor.observe(name, &cancel)),
        )
        .await;

        match self.output {
            OutputFormat::Table => {
                let infos: Vec<ClusterInfo> = names
                    .iter()
                    .zip(results.iter())
                    .map(|(name, result)| ClusterInfo::from_result(name, result))
                    .collect();
                println!(
                    "{}",
                    TableRenderer::new()
                        .render_clusters_list(descriptor.runtime().as_str(), &infos)
                );
            }
            OutputFormat::Json => {
                let states: Vec<_> = results
                    .iter()
                    .filter_map(|result| match result {
                        OperationResult::Success(state) => Some(state),
                        _ => None,
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&states)?);
            }
        }
        Ok(())
    }
}

impl DeleteCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let descriptor = self.provider.descriptor()?;
        let cancel = cancel_on_ctrl_c();

        descriptor
            .delete_cluster(&self.name, &cancel)
            .await
            .map_err(|e| report("Delete Cluster", &e))?;

        println!("Cluster {} deleted successfully!", self.name);
        Ok(())
    }
}

impl KubeconfigCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let descriptor = self.provider.descriptor()?;
        let cancel = cancel_on_ctrl_c();

        let state = descriptor
            .read_cluster(&self.name, &cancel)
            .await
            .map_err(|e| report("Read Kubeconfig", &e))?
            .ok_or_else(|| report("Read Kubeconfig", &KindError::not_found(self.name.as_str())))?;

        match &self.output_file {
            Some(path) => {
                export_kubeconfig(&state, path)
                    .await
                    .map_err(|e| report("Write Kubeconfig", &e))?;
                println!("Kubeconfig for {} written to {}", self.name, path.display());
            }
            None => {
                let kubeconfig = state
                    .kubeconfig
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("Cluster {} has no kubeconfig", self.name))?;
                print!("{}", kubeconfig.expose());
            }
        }
        Ok(())
    }
}

impl PlanCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let prior = self.from.as_deref().map(load_spec).transpose()?;
        let desired = self.to.as_deref().map(load_spec).transpose()?;

        match (&prior, &desired) {
            (Some(prior), Some(desired)) => {
                let plan = plan_change(prior, desired);
                println!("{}", TableRenderer::new().render_plan(&desired.name, &plan));
            }
            (None, Some(desired)) => println!("{}: create", desired.name),
            (Some(prior), None) => println!("{}: delete", prior.name),
            (None, None) => anyhow::bail!("Nothing to plan (use --from and/or --to)"),
        }
        Ok(())
    }
}

impl ApplyCommand {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let prior = self.from.as_deref().map(load_spec).transpose()?;
        let desired = self.to.as_deref().map(load_spec).transpose()?;
        let descriptor = self.provider.descriptor()?;
        let cancel = cancel_on_ctrl_c();

        let outcome = descriptor
            .apply(prior.as_ref(), desired.as_ref(), &cancel)
            .await
            .map_err(|e| report("Apply Cluster", &e))?;

        match &outcome {
            ApplyOutcome::Created(state) => println!("Cluster {} created", state.name),
            ApplyOutcome::Unchanged(state) => println!("Cluster {} is up to date", state.name),
            ApplyOutcome::UpdatedInPlace { fields, state } => println!(
                "Cluster {} updated in place ({})",
                state.name,
                join_fields(fields)
            ),
            ApplyOutcome::Replaced { fields, state } => println!(
                "Cluster {} replaced ({})",
                state.name,
                join_fields(fields)
            ),
            ApplyOutcome::Recreated { state, .. } => println!(
                "Cluster {} was missing and has been created again",
                state.name
            ),
            ApplyOutcome::Deleted { name } => println!("Cluster {} deleted", name),
        }

        if let Some(state) = outcome.state() {
            println!("{}", TableRenderer::new().render_cluster_status(state));
        }
        Ok(())
    }
}

fn join_fields(fields: &[crate::domain::cluster::SpecField]) -> String {
    fields
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_flags_override_defaults() {
        let cmd = CreateCommand::parse_from([
            "create",
            "--name",
            "dev",
            "--workers",
            "2",
            "--wait",
            "120",
        ]);
        let spec = cmd.build_spec().unwrap();
        assert_eq!(spec.name, "dev");
        assert_eq!(spec.worker_nodes, Some(2));
        assert_eq!(spec.wait_for_ready, Some(120));
        assert!(spec.node_image.is_none());
    }

    #[test]
    fn test_create_requires_name() {
        let cmd = CreateCommand::parse_from(["create"]);
        assert!(cmd.build_spec().is_err());
    }

    #[test]
    fn test_provider_overrides() {
        let cmd = ListCommand::parse_from([
            "list",
            "--runtime",
            "podman",
            "-D",
            "timeout.read=5",
        ]);
        let config = cmd.provider.load_config().unwrap();
        assert_eq!(config.runtime.as_deref(), Some("podman"));
        assert_eq!(config.timeouts.read_secs, 5);
    }

    #[test]
    fn test_unknown_property_rejected() {
        let cmd = DeleteCommand::parse_from(["delete", "dev", "-D", "no.such=key"]);
        assert!(cmd.provider.load_config().is_err());
    }
}
