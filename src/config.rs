//! Configuration for the header miner
//!
//! Command line arguments with validation and defaults. The mining core has
//! no configuration surface of its own; everything here belongs to the
//! daemon shell around it.

use crate::{Error, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// Complete configuration for the miner daemon
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(
    name = "sha256d-miner",
    version = env!("CARGO_PKG_VERSION"),
    about = "Midstate-optimized double-SHA256 header miner"
)]
pub struct Config {
    /// Print the parsed configuration and exit
    #[arg(long)]
    #[serde(default)]
    pub print_config: bool,

    /// Address to listen on for job connections
    #[arg(short = 'l', long, default_value = "127.0.0.1:3333")]
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Nonces tried between cancellation checks
    #[arg(short = 'b', long, default_value = "1048576")]
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Log level
    #[arg(long, default_value = "info")]
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
}

impl Config {
    /// Parse and validate the configuration
    pub fn load() -> Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if self.batch_size == 0 {
            return Err(Error::config("batch size must be greater than 0"));
        }
        Ok(())
    }

    /// Get the listen socket address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| Error::config(format!("invalid listen address: {e}")))
    }
}

// Default value functions for serde
fn default_listen() -> String {
    "127.0.0.1:3333".to_string()
}
fn default_batch_size() -> u32 {
    1_048_576
}
fn default_log_level() -> LogLevel {
    LogLevel::Info
}
