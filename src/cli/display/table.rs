//! Table rendering for CLI output

use super::colors::table_color_to_colored_str;
use super::{ColorTheme, StatusIcon};
use crate::domain::cluster::{ChangePlan, ClusterPhase, ClusterState, OperationResult};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Table};

/// Cluster information for list display
#[derive(Debug, Clone)]
pub struct ClusterInfo {
    pub name: String,
    pub phase: ClusterPhase,
    pub context: Option<String>,
    pub server: Option<String>,
}

impl ClusterInfo {
    /// Row for a cluster named by `kind get clusters` whose detail read
    /// produced `result`.
    pub fn from_result(name: &str, result: &OperationResult) -> Self {
        match result {
            OperationResult::Success(state) => Self {
                name: state.name.clone(),
                phase: state.phase,
                context: state.context.clone(),
                server: state.server.clone(),
            },
            other => Self {
                name: name.to_string(),
                phase: other.phase(),
                context: None,
                server: None,
            },
        }
    }
}

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Render clusters list as a formatted table
    pub fn render_clusters_list(&self, runtime: &str, clusters: &[ClusterInfo]) -> String {
        if clusters.is_empty() {
            return format!("No kind clusters found for runtime {}", runtime);
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("CLUSTER").set_alignment(CellAlignment::Left),
                Cell::new("CONTEXT").set_alignment(CellAlignment::Left),
                Cell::new("SERVER").set_alignment(CellAlignment::Left),
                Cell::new("STATUS").set_alignment(CellAlignment::Center),
            ]);

        for cluster in clusters {
            table.add_row(vec![
                Cell::new(&cluster.name),
                Cell::new(cluster.context.as_deref().unwrap_or("-")),
                Cell::new(cluster.server.as_deref().unwrap_or("-")),
                Cell::new(format!(
                    "{} {}",
                    StatusIcon::for_phase(cluster.phase),
                    StatusIcon::status_text(cluster.phase)
                ))
                .fg(self.theme.get_phase_color(cluster.phase)),
            ]);
        }

        let mut output = String::new();
        output.push_str(&format!(
            "╭─ Kind Clusters ({}) {} ─╮\n",
            runtime,
            format!("[{} clusters]", clusters.len()).bright_black()
        ));
        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&format!(
            "Legend: {} Running  {} Failed  {} Absent\n",
            StatusIcon::SUCCESS.green(),
            StatusIcon::ERROR.red(),
            StatusIcon::ABSENT.bright_black()
        ));

        output
    }

    /// Render a single observed cluster
    pub fn render_cluster_status(&self, state: &ClusterState) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.add_row(vec![
            Cell::new("Cluster"),
            Cell::new(&state.name).set_alignment(CellAlignment::Left),
        ]);
        table.add_row(vec![
            Cell::new("Runtime"),
            Cell::new(state.runtime.as_str()).fg(self.theme.info),
        ]);
        table.add_row(vec![
            Cell::new("Status"),
            Cell::new(format!(
                "{} {}",
                StatusIcon::for_phase(state.phase),
                StatusIcon::status_text(state.phase)
            ))
            .fg(self.theme.get_phase_color(state.phase)),
        ]);
        table.add_row(vec![
            Cell::new("Context"),
            Cell::new(state.context.as_deref().unwrap_or("-")),
        ]);
        table.add_row(vec![
            Cell::new("Server"),
            Cell::new(state.server.as_deref().unwrap_or("-")),
        ]);
        table.add_row(vec![
            Cell::new("Observed"),
            Cell::new(state.observed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .fg(self.theme.muted),
        ]);

        table.to_string()
    }

    /// One-line summary of what an apply would do
    pub fn render_plan(&self, name: &str, plan: &ChangePlan) -> String {
        let (icon, color) = match plan {
            ChangePlan::NoOp => (StatusIcon::SUCCESS, self.theme.success),
            ChangePlan::UpdateInPlace { .. } => (StatusIcon::PENDING, self.theme.info),
            ChangePlan::Replace { .. } => (StatusIcon::WARNING, self.theme.warning),
        };
        format!(
            "{} {}: {}",
            icon.color(table_color_to_colored_str(color)),
            name,
            plan.to_string().color(table_color_to_colored_str(color))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cluster::{Kubeconfig, SpecField};
    use crate::domain::config::RuntimeChoice;
    use crate::shared::ErrorKind;

    #[test]
    fn test_render_empty_clusters() {
        let renderer = TableRenderer::new();
        let output = renderer.render_clusters_list("docker", &[]);
        assert!(output.contains("No kind clusters found"));
    }

    #[test]
    fn test_render_single_cluster() {
        let renderer = TableRenderer::new();
        let clusters = vec![ClusterInfo {
            name: "ci-test".to_string(),
            phase: ClusterPhase::Present,
            context: Some("kind-ci-test".to_string()),
            server: Some("https://127.0.0.1:43117".to_string()),
        }];

        let output = renderer.render_clusters_list("podman", &clusters);
        assert!(output.contains("ci-test"));
        assert!(output.contains("kind-ci-test"));
        assert!(output.contains("Running"));
        assert!(output.contains("podman"));
    }

    #[test]
    fn test_cluster_info_from_failure() {
        let result = OperationResult::Failure {
            kind: ErrorKind::Timeout,
            message: "timed out".to_string(),
            raw_output: String::new(),
        };
        let info = ClusterInfo::from_result("dev", &result);
        assert_eq!(info.name, "dev");
        assert_eq!(info.phase, ClusterPhase::Failed);
        assert!(info.context.is_none());
    }

    #[test]
    fn test_render_cluster_status() {
        let state = ClusterState::present(
            "dev",
            RuntimeChoice::Docker,
            Kubeconfig::new("token: hidden"),
        )
        .with_endpoint(Some("kind-dev".to_string()), None);
        let output = TableRenderer::new().render_cluster_status(&state);
        assert!(output.contains("kind-dev"));
        assert!(output.contains("docker"));
        assert!(!output.contains("hidden"));
    }

    #[test]
    fn test_render_plan() {
        let plan = ChangePlan::Replace {
            fields: vec![SpecField::WorkerNodes],
        };
        let output = TableRenderer::new().render_plan("dev", &plan);
        assert!(output.contains("dev"));
        assert!(output.contains("replace"));
    }
}
