//! Error types for asset loading

use osrs_cache::CacheError;
use osrs_formats::{FormatError, IndexId};
use thiserror::Error;

/// Errors raised while loading or decoding game definitions
#[derive(Debug, Error)]
pub enum AssetError {
    /// One record failed to decode; carries the record it came from
    #[error("failed to decode {kind} {id}: {source}")]
    Decode {
        kind: &'static str,
        id: u32,
        #[source]
        source: FormatError,
    },

    /// The provider could not produce the underlying bytes
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Archive bytes could not be split into files
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// An index the facade depends on is absent from the snapshot
    #[error("index {0} is missing from the cache")]
    MissingIndex(IndexId),
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;
