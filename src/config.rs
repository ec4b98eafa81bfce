//! Application configuration management.
//!
//! Settings that make sense to persist across runs (whether new links
//! are marked read-only, standing ignore patterns, a default event-log
//! path) live in a TOML file under the platform config directory. CLI
//! flags always win over the file.

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Mark newly created links read-only (dedup).
    #[serde(default = "default_mark_read_only")]
    pub mark_read_only: bool,

    /// Ignore patterns applied to every run, in addition to CLI ones.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Default path for the CSV event log, if any.
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

fn default_mark_read_only() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mark_read_only: true,
            ignore_patterns: Vec::new(),
            log_path: None,
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    ///
    /// Any failure (missing file, parse error) falls back to defaults;
    /// configuration is a convenience, never a reason to refuse a run.
    pub fn load() -> Self {
        match Self::load_internal() {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn load_internal() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save the configuration to the default platform-specific path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "dupelink", "dupelink")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
