// CLI command definitions

use super::kind::{
    ApplyCommand, CreateCommand, DeleteCommand, GetCommand, KubeconfigCommand, ListCommand,
    PlanCommand,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "kind-kube",
    version,
    about = "Lifecycle manager for Kind clusters",
    long_about = "A standalone CLI tool for creating, inspecting and reconciling Kind (Kubernetes in Docker) clusters"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Create a new Kind cluster
    Create(CreateCommand),

    /// Show one cluster
    Get(GetCommand),

    /// List all Kind clusters for the selected runtime
    List(ListCommand),

    /// Delete a cluster (succeeds if it is already gone)
    Delete(DeleteCommand),

    /// Print a cluster's kubeconfig
    Kubeconfig(KubeconfigCommand),

    /// Show what apply would do between two specs
    Plan(PlanCommand),

    /// Move a cluster from one spec to another
    Apply(ApplyCommand),
}
