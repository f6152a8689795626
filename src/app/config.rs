use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_LOCAL_TERMINAL_URL, HTTP_REQUEST_TIMEOUT_MS,
    LOCAL_HEARTBEAT_TIMEOUT_MS, LOCAL_REQUEST_TIMEOUT_MS, MANAGER_DEFAULT_CACHE_MS,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Main REST API
    #[serde(default)]
    pub api: ApiConfig,

    /// Terminal on the local network
    #[serde(default)]
    pub local: LocalConfig,

    /// Cache lifetimes
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Main REST API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL requests are resolved against
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_ms: HTTP_REQUEST_TIMEOUT_MS,
            auth_token: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Local terminal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Timeout for the reachability probe
    pub heartbeat_timeout_ms: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOCAL_TERMINAL_URL.to_string(),
            timeout_ms: LOCAL_REQUEST_TIMEOUT_MS,
            heartbeat_timeout_ms: LOCAL_HEARTBEAT_TIMEOUT_MS,
        }
    }
}

impl LocalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }
}

/// Cache lifetime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Fallback lifetime for resources without their own
    pub global_ttl_ms: u64,
    /// Per-resource overrides, keyed by resource type
    #[serde(default)]
    pub resources: BTreeMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            global_ttl_ms: MANAGER_DEFAULT_CACHE_MS,
            resources: BTreeMap::new(),
        }
    }
}

impl CacheConfig {
    pub fn global_ttl(&self) -> Duration {
        Duration::from_millis(self.global_ttl_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level used when RUST_LOG is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let global_config = get_config_dir()?.join("config.toml");
    let local_config = PathBuf::from(".restkit/config.toml");

    load_config_from(&[global_config.as_path(), local_config.as_path()])
}

/// Layer defaults, then each existing TOML file in order, then the
/// environment (`RESTKIT_API__BASE_URL` style)
pub fn load_config_from(files: &[&Path]) -> Result<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    for file in files {
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }
    }

    figment = figment.merge(Env::prefixed("RESTKIT_").split("__"));

    figment
        .extract()
        .context("Failed to load configuration")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "restkit") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("restkit");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist.
/// Returns the files that were written.
pub fn init_config() -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();

    let config_file = get_config_dir()?.join("config.toml");
    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
        created.push(config_file);
    }

    let local_example = PathBuf::from(".restkit/config.toml.example");
    if !local_example.exists() {
        if let Some(parent) = local_example.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let example_config = r#"# Project configuration
# Overrides the global settings for this directory

[api]
base_url = "http://localhost:8000"
timeout_ms = 30000

[local]
base_url = "http://localhost:5000"

[cache]
global_ttl_ms = 300000

[cache.resources]
areas = 60000
nodes = 30000
"#;
        std::fs::write(&local_example, example_config)?;
        created.push(local_example);
    }

    Ok(created)
}
