use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::{Config, ServerConfig};

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

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/armlink/config.toml` on Unix/macOS, or equivalent
    /// on other platforms via `dirs::config_dir()`. Falls back to the
    /// current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("armlink").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// - If the file doesn't exist, returns `Config::default()`.
    /// - If the file exists, parses it as TOML and validates.
    /// - Returns an error if reading, parsing, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Config::default());
        }

        Self::load_from(&path)
    }

    /// Loads configuration from an explicit path.
    ///
    /// Unlike [`Config::load`], a missing file is an error here: the
    /// caller asked for this file specifically.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The serial port name and baud rate are set
    /// - The response timeout and retention capacities are non-zero
    /// - The bind address parses
    /// - A password is set when development mode is off
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.port.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "serial.port must not be empty".to_string(),
            });
        }

        if self.serial.baud_rate == 0 {
            return Err(ConfigError::ValidationError {
                message: "serial.baud_rate must be non-zero".to_string(),
            });
        }

        if self.serial.response_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "serial.response_timeout_ms must be non-zero".to_string(),
            });
        }

        if self.serial.buffer_capacity == 0 || self.serial.history_capacity == 0 {
            return Err(ConfigError::ValidationError {
                message: "serial.buffer_capacity and serial.history_capacity must be non-zero"
                    .to_string(),
            });
        }

        self.server.bind_address()?;

        if !self.auth.development_mode && self.auth.password.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "auth.password is required when development_mode is off".to_string(),
            });
        }

        Ok(())
    }
}

impl ServerConfig {
    /// Parse the configured bind address.
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|e| ConfigError::ValidationError {
                message: format!("invalid server.bind_addr '{}': {}", self.bind_addr, e),
            })
    }
}
