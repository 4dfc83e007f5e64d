use anyhow::{Context, Result};
use std::path::PathBuf;

/// Centralized path management for gistwall

/// Get the gistwall config directory
pub fn gistwall_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("gistwall");
    Ok(config_dir)
}

/// Get the gistwall data directory
pub fn gistwall_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
            home.join(".local/share")
        })
        .join("gistwall")
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(gistwall_config_dir()?.join("config.toml"))
}

pub fn default_database_path() -> PathBuf {
    gistwall_data_dir().join("history.db")
}
