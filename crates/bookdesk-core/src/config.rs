//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the remote store url, its API key, the request timeout and the tab the
//! console opens on.
//!
//! Configuration is stored at `~/.config/bookdesk/config.json`. The
//! `BOOKDESK_API_URL` and `BOOKDESK_API_KEY` environment variables override
//! the file, so a `.env` file loaded by the binary is enough to run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_TIMEOUT_SECS;

/// Application name used for config directory paths
const APP_NAME: &str = "bookdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "BOOKDESK_API_URL";
pub const ENV_API_KEY: &str = "BOOKDESK_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Tab shown on startup (`pending`, `approved`, `declined`, `availability`).
    #[serde(default)]
    pub default_tab: Option<String>,
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok());
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

    /// Replace file values with non-empty values from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = Some(key);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn is_complete(&self) -> bool {
        self.api_url.is_some() && self.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config {
            api_url: Some("https://file.example.com".to_string()),
            api_key: Some("file-key".to_string()),
            ..Config::default()
        };
        config.apply_overrides(|name| match name {
            ENV_API_URL => Some("https://env.example.com".to_string()),
            ENV_API_KEY => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.api_url.as_deref(), Some("https://env.example.com"));
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn test_request_timeout_default() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!config.is_complete());
    }

    #[test]
    fn test_parse_partial_file() {
        let config: Config =
            serde_json::from_str(r#"{"api_url": "https://db.example.com", "api_key": null}"#)
                .unwrap();
        assert_eq!(config.api_url.as_deref(), Some("https://db.example.com"));
        assert!(config.default_tab.is_none());
    }
}
