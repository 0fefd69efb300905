//! Error handling for the header miner
//!
//! Error types covering job ingestion, the search loop, and the transport,
//! with a recoverability classification used by the job loop.

use thiserror::Error;

/// Result type alias for miner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the header miner
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors (config printing only)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Job message exceeded the bounded ingestion buffer
    #[error("job message exceeded {limit} byte buffer")]
    BufferOverflow { limit: usize },

    /// Job message did not match the fixed wire shape
    #[error("malformed job: {field}: {message}")]
    MalformedJob { field: &'static str, message: String },

    /// Header validation errors
    #[error("invalid header: {message}")]
    Header { message: String },

    /// Target validation errors
    #[error("invalid target: {message}")]
    Target { message: String },

    /// Transport read/write could not complete
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a buffer overflow error
    pub fn buffer_overflow(limit: usize) -> Self {
        Self::BufferOverflow { limit }
    }

    /// Create a malformed job error naming the missing or invalid field
    pub fn malformed_job(field: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedJob {
            field,
            message: message.into(),
        }
    }

    /// Create a header error
    pub fn header(message: impl Into<String>) -> Self {
        Self::Header {
            message: message.into(),
        }
    }

    /// Create a target error
    pub fn target(message: impl Into<String>) -> Self {
        Self::Target {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable at the job-loop boundary.
    ///
    /// A recoverable error aborts only the current job; the loop resumes
    /// waiting for the next one. Transport and I/O failures are fatal to
    /// the connection and propagate.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::BufferOverflow { .. }
                | Error::MalformedJob { .. }
                | Error::Header { .. }
                | Error::Target { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::BufferOverflow { .. } => "buffer_overflow",
            Error::MalformedJob { .. } => "malformed_job",
            Error::Header { .. } => "header",
            Error::Target { .. } => "target",
            Error::Transport { .. } => "transport",
            Error::Config { .. } => "config",
        }
    }
}
