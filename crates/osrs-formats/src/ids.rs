//! Strongly typed cache addresses
//!
//! Indices, archives and files are all plain integers on the wire. The newtypes
//! keep them from being mixed up at call sites and cost nothing at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index number (0..=254 data, 255 meta index)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IndexId(pub u8);

impl IndexId {
    /// The meta index whose archives are the reference tables of every other index
    pub const META: Self = Self(255);

    /// Whether this is the meta index
    pub const fn is_meta(self) -> bool {
        self.0 == Self::META.0
    }
}

/// Archive (group) number within an index
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ArchiveId(pub u32);

/// File number within an archive
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FileId(pub u32);

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<IndexId> for ArchiveId {
    /// The reference table of index `i` is archive `i` of the meta index
    fn from(index: IndexId) -> Self {
        Self(u32::from(index.0))
    }
}

/// Hash an archive or file name the way the reference table stores it
///
/// Names are lowercased and folded with `h = 31 * h + byte` in wrapping
/// 32-bit arithmetic.
pub fn name_hash(name: &str) -> i32 {
    name.bytes().fold(0i32, |hash, byte| {
        hash.wrapping_mul(31)
            .wrapping_add(i32::from(byte.to_ascii_lowercase()))
    })
}
