//! System-wide configuration for vervids
//!
//! System config is stored at `~/.config/vervids/config.toml` (Linux),
//! `~/Library/Application Support/vervids/config.toml` (macOS) or
//! `%APPDATA%\vervids\config.toml` (Windows).
//!
//! Setting `VERVIDS_HOME` relocates the config file, the selected-project
//! context and the default local storage root under that one directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use vv_core::{Backend, StorageConfig};
use vv_journal::{ContextStore, EngineOptions};

/// Environment variable overriding the vervids home directory
pub const HOME_ENV: &str = "VERVIDS_HOME";

/// System-wide vervids configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Where new projects are stored
    pub storage: StorageConfig,

    /// Project file rules
    pub project: ProjectConfig,
}

/// Project file rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Extension every project file must have (default: aepx, empty disables the check)
    pub required_extension: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            required_extension: "aepx".to_string(),
        }
    }
}

impl ProjectConfig {
    pub fn engine_options(&self) -> EngineOptions {
        let ext = self.required_extension.trim().trim_start_matches('.');
        EngineOptions {
            required_extension: (!ext.is_empty()).then(|| ext.to_string()),
        }
    }
}

impl SystemConfig {
    /// Backend for newly initialized projects
    pub fn open_default_backend(&self) -> Result<Box<dyn Backend>> {
        let fallback = default_storage_root()?;
        Ok(self.storage.open_default(&fallback))
    }
}

/// vervids home: `$VERVIDS_HOME`, or `~/.vervids`
pub fn home_dir() -> Option<PathBuf> {
    match std::env::var_os(HOME_ENV) {
        Some(home) if !home.is_empty() => Some(PathBuf::from(home)),
        _ => dirs::home_dir().map(|h| h.join(".vervids")),
    }
}

/// Get the system config file path
pub fn config_file_path() -> Option<PathBuf> {
    match std::env::var_os(HOME_ENV) {
        Some(home) if !home.is_empty() => Some(PathBuf::from(home).join("config.toml")),
        _ => dirs::config_dir().map(|c| c.join("vervids").join("config.toml")),
    }
}

/// Default root of the local storage backend
pub fn default_storage_root() -> Result<PathBuf> {
    home_dir()
        .map(|h| h.join("storage"))
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory; set {}", HOME_ENV))
}

/// Store for the selected-project record
pub fn context_store() -> Result<ContextStore> {
    let home = home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory; set {}", HOME_ENV))?;
    Ok(ContextStore::new(&home))
}

/// Load system configuration
///
/// Returns default config if the file doesn't exist.
pub fn load() -> Result<SystemConfig> {
    let config_path = match config_file_path() {
        Some(p) => p,
        None => {
            tracing::debug!("Could not determine config directory, using defaults");
            return Ok(SystemConfig::default());
        }
    };

    load_from(&config_path)
}

/// Load configuration from an explicit path, defaulting if it is missing
pub fn load_from(config_path: &Path) -> Result<SystemConfig> {
    if !config_path.exists() {
        tracing::debug!("System config not found at {}, using defaults", config_path.display());
        return Ok(SystemConfig::default());
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read system config at {}", config_path.display()))?;

    let config: SystemConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse system config at {}", config_path.display()))?;

    tracing::debug!("Loaded system config from {}", config_path.display());
    Ok(config)
}

/// Generate example config content for display
pub fn example_config() -> String {
    let config = SystemConfig::default();
    let mut content = String::from("# vervids System Configuration\n");
    content.push_str("# Location: ~/.config/vervids/config.toml (or $VERVIDS_HOME/config.toml)\n");
    content.push_str("#\n");
    content.push_str("# backend = \"local\" stores projects under local_root\n");
    content.push_str("# (default: ~/.vervids/storage); backend = \"docker\" uses the\n");
    content.push_str("# [storage.docker] container.\n\n");

    content.push_str(&toml::to_string_pretty(&config).unwrap_or_default());
    content
}
