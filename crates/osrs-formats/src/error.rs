//! Format error types

use thiserror::Error;

/// Errors raised while parsing cache data
///
/// Every variant is fatal: a format error means corrupt input or an unhandled
/// revision, and recovering from it would yield silently wrong data.
#[derive(Debug, Error)]
pub enum FormatError {
    /// A read ran past the end of the buffer
    #[error("unexpected end of data: wanted {wanted} bytes at offset {offset}, buffer is {len} bytes")]
    UnexpectedEof {
        /// Cursor position when the read started
        offset: usize,
        /// Number of bytes the read needed
        wanted: usize,
        /// Total buffer length
        len: usize,
    },

    /// Container header or length fields are inconsistent with the buffer
    #[error("invalid container: {0}")]
    InvalidContainer(String),

    /// Container compression type byte is not one of none/bzip2/gzip
    #[error("unknown compression type: {0}")]
    UnknownCompression(u8),

    /// The compressed payload could not be inflated
    #[error("decompression failed: {0}")]
    Decompression(String),

    /// Reference table protocol outside 5..=7
    #[error("unsupported reference table protocol: {0}")]
    UnsupportedProtocol(u8),

    /// A delta-encoded ID stream did not strictly increase
    #[error("{what} IDs must strictly increase: {previous} followed by {next}")]
    NonIncreasingId {
        /// Which stream was being decoded ("archive" or "file")
        what: &'static str,
        /// The previous ID
        previous: u32,
        /// The offending ID
        next: u32,
    },

    /// Archive footer or extents do not fit the archive payload
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// An asset decoder met an opcode it does not know
    #[error("unknown {kind} opcode: {opcode}")]
    UnknownOpcode {
        /// Asset kind being decoded
        kind: &'static str,
        /// The unrecognized opcode
        opcode: u8,
    },

    /// The XTEA key JSON did not match the expected shape
    #[error("invalid XTEA keys: {0}")]
    InvalidKeys(#[from] serde_json::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for format operations
pub type FormatResult<T> = Result<T, FormatError>;
