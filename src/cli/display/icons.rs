//! Status icons for CLI output

use crate::domain::cluster::ClusterPhase;

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    /// Cluster running
    pub const SUCCESS: &'static str = "✓";

    /// Change pending
    pub const WARNING: &'static str = "⚠";

    /// Operation failed
    pub const ERROR: &'static str = "✗";

    /// Transitional phases
    pub const PENDING: &'static str = "⏳";

    /// Cluster does not exist
    pub const ABSENT: &'static str = "○";

    pub fn for_phase(phase: ClusterPhase) -> &'static str {
        match phase {
            ClusterPhase::Present => Self::SUCCESS,
            ClusterPhase::Creating | ClusterPhase::Deleting => Self::PENDING,
            ClusterPhase::Absent => Self::ABSENT,
            ClusterPhase::Failed => Self::ERROR,
        }
    }

    pub fn status_text(phase: ClusterPhase) -> &'static str {
        match phase {
            ClusterPhase::Present => "Running",
            ClusterPhase::Creating => "Creating",
            ClusterPhase::Deleting => "Deleting",
            ClusterPhase::Absent => "Absent",
            ClusterPhase::Failed => "Failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_phase() {
        assert_eq!(StatusIcon::for_phase(ClusterPhase::Present), StatusIcon::SUCCESS);
        assert_eq!(StatusIcon::for_phase(ClusterPhase::Creating), StatusIcon::PENDING);
        assert_eq!(StatusIcon::for_phase(ClusterPhase::Absent), StatusIcon::ABSENT);
        assert_eq!(StatusIcon::for_phase(ClusterPhase::Failed), StatusIcon::ERROR);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(StatusIcon::status_text(ClusterPhase::Present), "Running");
        assert_eq!(StatusIcon::status_text(ClusterPhase::Deleting), "Deleting");
        assert_eq!(StatusIcon::status_text(ClusterPhase::Failed), "Failed");
    }
}
