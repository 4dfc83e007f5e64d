use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::fs;

use crate::common::paths;

#[cfg(windows)]
const DEFAULT_HELPER: &str = "cambiarescritorio.exe";
#[cfg(not(windows))]
const DEFAULT_HELPER: &str = "feh";

fn default_interval_secs() -> u64 {
    3600
}

fn default_helper() -> String {
    DEFAULT_HELPER.to_string()
}

fn default_helper_args() -> Vec<String> {
    if cfg!(windows) {
        Vec::new()
    } else {
        vec!["--bg-fill".to_string()]
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GistwallConfig {
    /// URL returning `<image_url>,<timestamp>`
    pub endpoint: String,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub run_on_start: bool,
    /// Program that sets the wallpaper; the image path is appended as the last argument
    #[serde(default = "default_helper")]
    pub helper: String,
    #[serde(default = "default_helper_args")]
    pub helper_args: Vec<String>,
    /// Where images are downloaded before being applied, relative to the working directory
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    pub database: Option<PathBuf>,
}

impl GistwallConfig {
    pub fn config_file_path() -> Result<PathBuf> {
        paths::default_config_path()
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cfg_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };
        if !cfg_path.exists() {
            anyhow::bail!(
                "config file {} not found; create it with at least `endpoint = \"<url>\"`",
                cfg_path.display()
            );
        }

        let s = fs::read_to_string(&cfg_path)
            .with_context(|| format!("reading config {}", cfg_path.display()))?;
        Self::from_toml(&s).with_context(|| format!("loading config {}", cfg_path.display()))
    }

    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("parsing config toml")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            anyhow::bail!("`endpoint` must not be empty");
        }
        if self.interval_secs == 0 {
            anyhow::bail!("`interval_secs` must be greater than zero");
        }
        if self.helper.trim().is_empty() {
            anyhow::bail!("`helper` must not be empty");
        }
        Ok(())
    }

    pub fn cadence(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(paths::default_database_path)
    }
}
