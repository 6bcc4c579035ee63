//! Error types for cache providers

use osrs_formats::FormatError;
use osrs_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur while reading or installing a cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Stored bytes could not be decoded
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// The remote archive request failed
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// IO error during disk operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking extraction task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Bulk install could not complete
    #[error("Install failed: {0}")]
    Install(String),

    /// Metadata store could not be written
    #[error("Metadata error: {0}")]
    Metadata(String),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
