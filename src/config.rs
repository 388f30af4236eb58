//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the base URL of the authentication service and the name of the session
//! storage slot.
//!
//! Configuration is stored at `~/.config/chatgate/config.json`. Both fields
//! can be overridden via `CHATGATE_API_URL` and `CHATGATE_SESSION_KEY`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "chatgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default base URL of the authentication service
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Default name of the session storage slot
const DEFAULT_SESSION_KEY: &str = "chat-app-current-user";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub session_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

impl Config {
    /// Load the config file if present, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var("CHATGATE_API_URL") {
            config.api_base_url = url;
        }
        if let Ok(key) = std::env::var("CHATGATE_SESSION_KEY") {
            config.session_key = key;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Path of the session storage slot, keyed by the configured name.
    pub fn session_path(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir
            .join(APP_NAME)
            .join(format!("{}.json", self.session_key)))
    }
}
