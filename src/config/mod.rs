//! Application Configuration
//!
//! Engine and report settings stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use crate::consensus::ConsensusConfig;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Consensus engine settings
    pub consensus: ConsensusConfig,
    /// Replay report settings
    pub report: ReportSettings,
}

/// What the replay report prints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Print per-field statistics
    pub show_stats: bool,
    /// Observations listed when inspecting a single field
    pub history_depth: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            show_stats: false,
            history_depth: 5,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        // Check consensus defaults
        assert_eq!(config.consensus.max_history_per_field, 50);
        assert_eq!(config.consensus.min_occurrences_for_majority, 3);
        assert!(config.consensus.comma_required);

        // Check report defaults
        assert!(!config.report.show_stats);
        assert_eq!(config.report.history_depth, 5);
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.consensus.max_history_per_field = 20;
        config.consensus.comma_required = false;
        config.report.show_stats = true;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.consensus.max_history_per_field, 20);
        assert!(!parsed.consensus.comma_required);
        assert!(parsed.report.show_stats);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: AppConfig = toml::from_str("[consensus]\ncomma_required = false\n").unwrap();

        assert!(!parsed.consensus.comma_required);
        assert_eq!(parsed.consensus.max_history_per_field, 50);
        assert_eq!(parsed.report.history_depth, 5);
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = AppConfig::default();
        config.consensus.min_occurrences_for_majority = 7;

        let temp_file = NamedTempFile::new().unwrap();
        save_config(&config, temp_file.path()).unwrap();

        let loaded = load_config(temp_file.path()).unwrap();
        assert_eq!(loaded.consensus.min_occurrences_for_majority, 7);
        assert_eq!(loaded.report.history_depth, config.report.history_depth);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }
}
