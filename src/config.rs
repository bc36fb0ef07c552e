//! Runtime configuration
//!
//! Defaults, overlaid by `<config dir>/gara-search/config.json` when present,
//! overlaid by `GARA_*` environment variables.

use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_REVEAL_INTERVAL_MS: u64 = 50;
pub const DEFAULT_PAGE_SIZE: u32 = 6;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub debounce_ms: u64,
    pub reveal_interval_ms: u64,
    pub page_size: u32,
    pub request_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            reveal_interval_ms: DEFAULT_REVEAL_INTERVAL_MS,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Load defaults, the user config file, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every search fail
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidVar {
                key: "page_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidVar {
                key: "request_timeout_ms".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = try_load::<String>("GARA_API_URL")? {
            self.api_base_url = url;
        }
        if let Some(ms) = try_load("GARA_DEBOUNCE_MS")? {
            self.debounce_ms = ms;
        }
        if let Some(ms) = try_load("GARA_REVEAL_INTERVAL_MS")? {
            self.reveal_interval_ms = ms;
        }
        if let Some(size) = try_load("GARA_PAGE_SIZE")? {
            self.page_size = size;
        }
        if let Some(ms) = try_load("GARA_REQUEST_TIMEOUT_MS")? {
            self.request_timeout_ms = ms;
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Location of the optional user config file
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("gara-search").join("config.json"))
}

fn try_load<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidVar {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => {
            debug!("{key} not set, keeping configured value");
            Ok(None)
        }
    }
}
