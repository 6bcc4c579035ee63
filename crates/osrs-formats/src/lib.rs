//! Binary format parsers for the Old School RuneScape JS5 cache
//!
//! This crate provides the read side of every layer below the asset decoders:
//!
//! - **Reader**: big-endian cursor with smart integers, sentinel reads and CP1252 strings
//! - **Container**: the compression envelope (none, bzip2, gzip) wrapping every group
//! - **Reference table**: the per-index directory stored in the meta index (255)
//! - **Archive**: splitting a decompressed group into its files
//! - **XTEA keys**: the map-square key store published alongside each cache
//!
//! The cache is addressed index → archive (group) → file. Index 255 is the meta
//! index; its archives are the reference tables of the other indices.
//!
//! # Example
//!
//! ```
//! use osrs_formats::{container, ReferenceTable};
//!
//! // An uncompressed container holding an empty protocol 5 reference table
//! let raw = [0, 0, 0, 0, 4, 5, 0, 0, 0];
//! let payload = container::decompress(&raw)?;
//! let table = ReferenceTable::decode(&payload)?;
//! assert_eq!(table.protocol, 5);
//! assert!(table.archives.is_empty());
//! # Ok::<(), osrs_formats::FormatError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::cast_possible_wrap)] // Intentional for binary operations
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::uninlined_format_args)] // Backwards compatibility

pub mod archive;
pub mod container;
pub mod error;
pub mod ids;
pub mod reader;
pub mod reference_table;
pub mod version;
pub mod xtea;

pub use archive::{ArchiveData, ArchiveFile, split_archive};
pub use container::{CompressionType, ContainerHeader};
pub use error::{FormatError, FormatResult};
pub use ids::{ArchiveId, FileId, IndexId, name_hash};
pub use reader::ByteReader;
pub use reference_table::{ArchiveReference, FileReference, ReferenceTable};
pub use version::{CacheVersion, Era};
pub use xtea::{XteaKey, XteaKeyManager};
