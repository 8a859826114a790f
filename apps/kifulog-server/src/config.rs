//! Server configuration.
//!
//! Loads and validates configuration from YAML files or environment variables.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
///
/// Example YAML:
/// ```yaml
/// rpc_addr: "0.0.0.0:9001"
/// http_addr: "0.0.0.0:8081"
/// data_dir: "/var/lib/kifulog/db"
/// drain_timeout_ms: 10000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// gRPC listen address
    #[serde(default = "default_rpc_addr")]
    pub rpc_addr: String,

    /// HTTP listen address (JSON gateway + health probe)
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Store root holding one file per collection
    pub data_dir: PathBuf,

    /// Upper bound on waiting for in-flight requests at shutdown
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_rpc_addr() -> String {
    "0.0.0.0:9001".to_string()
}

fn default_http_addr() -> String {
    "0.0.0.0:8081".to_string()
}

fn default_drain_timeout_ms() -> u64 {
    10_000
}

impl ServerConfig {
    /// Configuration with default addresses for the given store root.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            rpc_addr: default_rpc_addr(),
            http_addr: default_http_addr(),
            data_dir: data_dir.into(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }

    /// Load configuration from a YAML file.
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("Failed to read config file: {}", e)))?;

        let config: ServerConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Supported variables:
    /// - KIFULOG_RPC_ADDR
    /// - KIFULOG_HTTP_ADDR
    /// - KIFULOG_DATA_DIR (required)
    /// - KIFULOG_DRAIN_TIMEOUT_MS
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let data_dir = std::env::var("KIFULOG_DATA_DIR")
            .map_err(|_| ConfigError::MissingField("KIFULOG_DATA_DIR".to_string()))?;

        let rpc_addr = std::env::var("KIFULOG_RPC_ADDR").unwrap_or_else(|_| default_rpc_addr());
        let http_addr = std::env::var("KIFULOG_HTTP_ADDR").unwrap_or_else(|_| default_http_addr());

        let drain_timeout_ms = match std::env::var("KIFULOG_DRAIN_TIMEOUT_MS") {
            Ok(v) => v.parse().map_err(|e| {
                ConfigError::InvalidField(format!("Invalid KIFULOG_DRAIN_TIMEOUT_MS: {}", e))
            })?,
            Err(_) => default_drain_timeout_ms(),
        };

        let config = ServerConfig {
            rpc_addr,
            http_addr,
            data_dir: PathBuf::from(data_dir),
            drain_timeout_ms,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rpc_socket_addr()?;
        self.http_socket_addr()?;

        if !self.data_dir.is_dir() {
            return Err(ConfigError::InvalidField(format!(
                "data_dir {} is not a directory",
                self.data_dir.display()
            )));
        }

        if self.drain_timeout_ms == 0 {
            return Err(ConfigError::InvalidField(
                "drain_timeout_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Parsed gRPC listen address.
    pub fn rpc_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.rpc_addr
            .parse()
            .map_err(|e| ConfigError::InvalidField(format!("Invalid rpc_addr: {}", e)))
    }

    /// Parsed HTTP listen address.
    pub fn http_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.http_addr
            .parse()
            .map_err(|e| ConfigError::InvalidField(format!("Invalid http_addr: {}", e)))
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),
}
