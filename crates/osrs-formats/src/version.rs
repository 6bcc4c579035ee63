//! Cache version stamps
//!
//! Decoders gate fields introduced in later cache revisions on
//! [`ByteReader::is_after`](crate::ByteReader::is_after), which compares the
//! version attached to the reader against the revision that introduced the field.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache dialect
///
/// Only the Old School dialect is read; the enum exists so version stamps
/// order by era before revision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Era {
    /// Old School RuneScape
    #[default]
    Osrs,
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Osrs => write!(f, "osrs"),
        }
    }
}

/// Version of one index within a published cache
///
/// Ordered by era, then by the index's reference table revision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct CacheVersion {
    /// Cache dialect
    pub era: Era,
    /// Reference table revision of the index the data came from
    pub index_revision: u32,
}

impl CacheVersion {
    /// Create an Old School version stamp
    pub const fn osrs(index_revision: u32) -> Self {
        Self {
            era: Era::Osrs,
            index_revision,
        }
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.era, self.index_revision)
    }
}
