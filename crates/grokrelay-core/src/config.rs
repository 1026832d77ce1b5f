//! Relay configuration.
//!
//! Loaded from `config.json` in the data directory, with environment
//! overrides for container deployments. Missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DATA_DIR: &str = ".grokrelay";
const CONFIG_FILE: &str = "config.json";

/// Get data directory path.
///
/// Priority:
/// 1. `GROKRELAY_DATA_DIR` environment variable (for container deployments)
/// 2. `~/.grokrelay` (default)
pub fn get_data_dir() -> Result<PathBuf, String> {
    let data_dir = if let Ok(custom_dir) = std::env::var("GROKRELAY_DATA_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = dirs::home_dir().ok_or("Failed to resolve home directory")?;
        home.join(DATA_DIR)
    };

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| format!("Failed to create data directory: {}", e))?;
    }

    Ok(data_dir)
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Optional static bearer key; when set, tool routes require it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8045, api_key: None }
    }
}

/// Token pool worker cadence and cooldown policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PoolConfig {
    /// Seconds between batch-save ticks.
    pub save_interval_secs: u64,
    /// Seconds between status-refresh ticks.
    pub refresh_interval_secs: u64,
    /// Fixed cooldown applied when upstream gives no retry-after.
    pub cooldown_secs: u64,
    /// Prefer an upstream-supplied retry-after over the fixed cooldown.
    pub honor_retry_after: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            save_interval_secs: 30,
            refresh_interval_secs: 15,
            cooldown_secs: 300,
            honor_retry_after: true,
        }
    }
}

impl PoolConfig {
    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

/// Upstream backend endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the Grok chat API.
    pub base_url: String,
    /// Host prefixed onto relative media locators.
    pub asset_host: String,
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.x.ai/v1".to_string(),
            asset_host: "https://assets.grok.com/".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Top-level relay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub pool: PoolConfig,
    pub upstream: UpstreamConfig,
}

impl RelayConfig {
    /// Load configuration from the data directory.
    pub fn load() -> Result<Self, String> {
        let data_dir = get_data_dir()?;
        let config_path = data_dir.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| format!("Failed to read config file: {}", e))?;
            serde_json::from_str(&content)
                .map_err(|e| format!("Failed to parse config file: {}", e))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("GROKRELAY_PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(key) = std::env::var("GROKRELAY_API_KEY") {
            if !key.is_empty() {
                self.server.api_key = Some(key);
            }
        }
        if let Ok(base) = std::env::var("GROKRELAY_UPSTREAM_URL") {
            if !base.is_empty() {
                self.upstream.base_url = base;
            }
        }
    }
}
