//! Storage Layer
//!
//! Locates the platform directories for configuration and templates. The
//! engine keeps no state on disk; only these user files live here.

pub mod templates;

use anyhow::Result;
use std::path::PathBuf;

pub use templates::{load_template, save_template, ScanTemplate, TemplateField, TemplateReading};

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "readout", "ReadoutConsensus")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Directory holding saved scan templates
pub fn get_templates_dir() -> Result<PathBuf> {
    let dir = get_data_dir()?.join("templates");
    std::fs::create_dir_all(&dir)?;

    Ok(dir)
}
