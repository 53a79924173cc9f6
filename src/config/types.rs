use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Serial link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Port the arm is expected on at startup (e.g. "/dev/ttyUSB0", "COM3").
    #[serde(default = "default_port")]
    pub port: String,
    /// Baud rate for the arm's firmware (default: 9600).
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Whether the background reconnector runs (default: true).
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,
    /// Seconds between reconnect attempts (default: 5).
    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval_secs: u64,
    /// How long to wait for a reply to a command, in ms (default: 2000).
    #[serde(default = "default_response_timeout")]
    pub response_timeout_ms: u64,
    /// Lines observed this shortly before a command still count as its
    /// reply, in ms (default: 50).
    #[serde(default = "default_response_grace")]
    pub response_grace_ms: u64,
    /// Raw lines retained from the robot (default: 100).
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Command/response exchanges retained (default: 50).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP server (host:port).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Directory the web UI and calibration blob live in.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

/// Access control for the mutating endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// When true, no token is required (default: true).
    #[serde(default = "default_development_mode")]
    pub development_mode: bool,
    /// Shared secret checked against the X-Auth-Token header in
    /// production mode.
    #[serde(default)]
    pub password: String,
}

fn default_port() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_auto_reconnect() -> bool {
    true
}

fn default_reconnect_interval() -> u64 {
    5
}

fn default_response_timeout() -> u64 {
    2000
}

fn default_response_grace() -> u64 {
    50
}

fn default_buffer_capacity() -> usize {
    100
}

fn default_history_capacity() -> usize {
    50
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_development_mode() -> bool {
    true
}

impl SerialConfig {
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_secs(self.reconnect_interval_secs)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn response_grace(&self) -> Duration {
        Duration::from_millis(self.response_grace_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            auto_reconnect: default_auto_reconnect(),
            reconnect_interval_secs: default_reconnect_interval(),
            response_timeout_ms: default_response_timeout(),
            response_grace_ms: default_response_grace(),
            buffer_capacity: default_buffer_capacity(),
            history_capacity: default_history_capacity(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            development_mode: default_development_mode(),
            password: String::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}
