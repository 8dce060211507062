//! Configuration for the placement engine
//!
//! Durations are given in milliseconds in the TOML file:
//!
//! ```toml
//! api_base_url = "https://api.example.com"
//! debounce_ms = 3000
//! isolated_debounce_ms = 1000
//! remote_timeout_ms = 5000
//! vendor_id_threshold = 60
//! storage_path = "~/.placement/storage.json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::resolver::DEFAULT_VENDOR_ID_THRESHOLD;

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Configuration options for the placement engine
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementConfig {
    /// Base URL of the remote service
    pub api_base_url: String,

    /// Bearer token sent with remote requests
    pub auth_token: Option<String>,

    /// Delay before a batch write is sent after the last edit
    pub debounce: Duration,

    /// Delay before the primary (index 0) position is sent after the last edit
    pub isolated_debounce: Duration,

    /// Upper bound for a remote request, including the initial load
    pub remote_timeout: Duration,

    /// IDs at or above this value are vendor-scoped
    pub vendor_id_threshold: u64,

    /// File backing local storage (in-memory when absent)
    pub storage_path: Option<PathBuf>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3004".to_string(),
            auth_token: None,
            debounce: Duration::from_millis(3000),
            isolated_debounce: Duration::from_millis(1000),
            remote_timeout: Duration::from_millis(5000),
            vendor_id_threshold: DEFAULT_VENDOR_ID_THRESHOLD,
            storage_path: None,
        }
    }
}

/// TOML structure for deserializing configuration
#[derive(Deserialize)]
struct TomlConfig {
    api_base_url: Option<String>,
    auth_token: Option<String>,
    debounce_ms: Option<u64>,
    isolated_debounce_ms: Option<u64>,
    remote_timeout_ms: Option<u64>,
    vendor_id_threshold: Option<u64>,
    storage_path: Option<PathBuf>,
}

impl PlacementConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string; missing keys keep their defaults
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let defaults = Self::default();

        Ok(Self {
            api_base_url: parsed.api_base_url.unwrap_or(defaults.api_base_url),
            auth_token: parsed.auth_token,
            debounce: parsed
                .debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            isolated_debounce: parsed
                .isolated_debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.isolated_debounce),
            remote_timeout: parsed
                .remote_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.remote_timeout),
            vendor_id_threshold: parsed
                .vendor_id_threshold
                .unwrap_or(defaults.vendor_id_threshold),
            storage_path: parsed.storage_path,
        })
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    pub fn with_isolated_debounce(mut self, delay: Duration) -> Self {
        self.isolated_debounce = delay;
        self
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn with_vendor_id_threshold(mut self, threshold: u64) -> Self {
        self.vendor_id_threshold = threshold;
        self
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }
}
