//! sha256d-miner
//!
//! A Bitcoin proof-of-work header miner:
//! - double-SHA256 hash engine with midstate caching across nonce trials
//! - 256-bit little-endian target comparison
//! - single-job-at-a-time nonce search with an explicit exhaustion outcome
//! - fixed-shape job/share wire protocol over a pluggable byte transport

pub mod config;
pub mod engine;
pub mod error;
pub mod miner;
pub mod protocol;
pub mod sha256;
pub mod transport;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::{Header, Job, Nonce, Share, Target};

/// Application information
pub const APP_NAME: &str = "sha256d-miner";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
