use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::RuntimeConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl RuntimeConfig {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/mvikit/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("mvikit").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// If the file doesn't exist, returns `RuntimeConfig::default()`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(RuntimeConfig::default());
        }

        Self::load_from(&path)
    }

    /// Loads, parses and validates the given file. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: RuntimeConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The event buffer holds at least one event
    /// - The snapshot key is not blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_capacity == 0 {
            return Err(ConfigError::ValidationError {
                message: "event_capacity must be at least 1".to_string(),
            });
        }

        if self.state_key.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "state_key must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
