//! Server configuration.
//!
//! Loaded from an optional TOML file; every key has a default, and the CLI
//! may override the listen address.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Port used by the reference deployment.
pub const DEFAULT_PORT: u16 = 12345;

/// What to do with a line that does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedInput {
    /// Treat the seat as departed: broadcast `QUIT` and end the session.
    #[default]
    Disconnect,
    /// Log the line and keep reading.
    Ignore,
}

/// Configuration for the game server.
#[derive(Debug, Clone, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    host: String,

    /// Port to listen on. `0` picks a free port.
    port: u16,

    /// Length of each seat's outbound queue.
    outbound_capacity: usize,

    /// Policy for undecodable lines.
    malformed_input: MalformedInput,

    /// Default tracing filter when `RUST_LOG` is unset.
    log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            outbound_capacity: 64,
            malformed_input: MalformedInput::default(),
            log_filter: "info,duel_server=debug".to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!("Failed to read config file: {}", e))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| {
            ConfigError::new(format!("Failed to parse config: {}", e))
        })?;
        config.validate()?;
        info!(host = %config.host, port = config.port, "Config loaded");
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Overrides the listen host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Overrides the listen port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the malformed-input policy.
    pub fn with_malformed_input(mut self, policy: MalformedInput) -> Self {
        self.malformed_input = policy;
        self
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.outbound_capacity == 0 {
            return Err(ConfigError::new("outbound_capacity must be at least 1"));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::new("host must not be empty"));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
