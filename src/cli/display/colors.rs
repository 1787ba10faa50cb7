//! Color theme for CLI output

use crate::domain::cluster::ClusterPhase;
use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    pub fn get_phase_color(&self, phase: ClusterPhase) -> TableColor {
        match phase {
            ClusterPhase::Present => self.success,
            ClusterPhase::Creating | ClusterPhase::Deleting => self.warning,
            ClusterPhase::Failed => self.error,
            ClusterPhase::Absent => self.muted,
        }
    }
}

/// Convert comfy_table::Color to colored::Color string representation
pub fn table_color_to_colored_str(color: TableColor) -> &'static str {
    match color {
        TableColor::Green => "green",
        TableColor::Yellow => "yellow",
        TableColor::Red => "red",
        TableColor::Cyan => "cyan",
        TableColor::DarkGrey => "bright black",
        _ => "white",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme() {
        let theme = ColorTheme::default();
        assert_eq!(theme.success, TableColor::Green);
        assert_eq!(theme.warning, TableColor::Yellow);
        assert_eq!(theme.error, TableColor::Red);
    }

    #[test]
    fn test_get_phase_color() {
        let theme = ColorTheme::default();
        assert_eq!(theme.get_phase_color(ClusterPhase::Present), TableColor::Green);
        assert_eq!(theme.get_phase_color(ClusterPhase::Deleting), TableColor::Yellow);
        assert_eq!(theme.get_phase_color(ClusterPhase::Failed), TableColor::Red);
        assert_eq!(theme.get_phase_color(ClusterPhase::Absent), TableColor::DarkGrey);
    }

    #[test]
    fn test_colored_names() {
        assert_eq!(table_color_to_colored_str(TableColor::Yellow), "yellow");
        assert_eq!(table_color_to_colored_str(TableColor::Magenta), "white");
    }
}
