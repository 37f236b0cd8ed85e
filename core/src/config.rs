//! Configuration
//!
//! Endpoint configuration for the chat client, loaded with the following
//! priority (highest first):
//!
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! The configuration file follows the XDG Base Directory specification:
//! `$XDG_CONFIG_HOME/parley/parley.toml` (typically
//! `~/.config/parley/parley.toml`).
//!
//! # Example Configuration
//!
//! ```toml
//! endpoint = "ws://chat.example.internal:3000/"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding the endpoint
const ENDPOINT_ENV: &str = "PARLEY_ENDPOINT";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Chat client configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// WebSocket endpoint of the remote responder
    pub endpoint: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:3000/".to_string(),
        }
    }
}

impl ChatConfig {
    /// Load configuration: defaults, then the XDG config file if present,
    /// then environment overrides
    ///
    /// A malformed config file is logged and skipped rather than fatal.
    #[must_use]
    pub fn load() -> Self {
        let mut config = match default_config_path() {
            Some(path) if path.exists() => match Self::load_from_path(&path) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed config file");
                    Self::default()
                }
            },
            _ => Self::default(),
        };
        config.apply_env();
        config
    }

    /// Load configuration from a specific TOML file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&raw)?)
    }

    /// Build configuration from defaults plus environment overrides
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.is_empty() {
                self.endpoint = endpoint;
            }
        }
    }
}

/// Default configuration file path, if a config directory exists
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("parley").join("parley.toml"))
}
