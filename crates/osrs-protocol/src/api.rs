//! Archive API contract and snapshot descriptors

use async_trait::async_trait;
use bytes::Bytes;
use osrs_formats::{ArchiveId, Era, IndexId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Game name the archive uses for Old School caches
pub const OLDSCHOOL_GAME: &str = "oldschool";

/// Client build a cache was captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Build {
    pub major: u32,
    #[serde(default)]
    pub minor: Option<u32>,
}

impl fmt::Display for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}

/// One entry of the archive's cache listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDescriptor {
    pub id: u32,
    pub scope: String,
    pub game: String,
    #[serde(default)]
    pub environment: String,
    /// ISO-8601 capture time, absent for some historical caches
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub builds: Vec<Build>,
}

impl CacheDescriptor {
    /// Snapshot handle for providers, `None` for games this crate cannot read
    pub fn snapshot(&self) -> Option<CacheSnapshot> {
        (self.game == OLDSCHOOL_GAME).then(|| CacheSnapshot {
            id: self.id,
            scope: self.scope.clone(),
            era: Era::Osrs,
        })
    }

    /// Whether this descriptor was captured after `other`
    ///
    /// Ordered by timestamp (missing sorts oldest), then by ID.
    pub fn is_newer_than(&self, other: &Self) -> bool {
        (&self.timestamp, self.id) > (&other.timestamp, other.id)
    }
}

/// Immutable handle identifying one published cache build
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub id: u32,
    pub scope: String,
    pub era: Era,
}

impl CacheSnapshot {
    /// Old School snapshot in the default `runescape` scope
    pub fn osrs(id: u32) -> Self {
        Self {
            id,
            scope: "runescape".to_string(),
            era: Era::Osrs,
        }
    }
}

impl fmt::Display for CacheSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.scope, self.id, self.era)
    }
}

/// Typed calls against the remote cache archive
///
/// Implemented over HTTP by [`OpenRs2Client`](crate::OpenRs2Client); tests
/// substitute in-memory fakes.
#[async_trait]
pub trait ArchiveApi: Send + Sync {
    /// List every cache the archive knows
    async fn list_caches(&self) -> Result<Vec<CacheDescriptor>>;

    /// Raw container bytes of one group, `None` when the archive lacks it
    async fn group(
        &self,
        snapshot: &CacheSnapshot,
        index: IndexId,
        group: ArchiveId,
    ) -> Result<Option<Bytes>>;

    /// Raw `keys.json` document
    async fn keys(&self, snapshot: &CacheSnapshot) -> Result<Bytes>;

    /// Gzip-compressed tarball of every group in the snapshot
    async fn flat_export(&self, snapshot: &CacheSnapshot) -> Result<Bytes>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LISTING: &str = r#"[
        {"id": 1812, "scope": "runescape", "game": "oldschool", "environment": "live",
         "language": "en", "builds": [{"major": 221, "minor": null}],
         "timestamp": "2024-03-13T11:05:12Z", "sources": ["Jagex"], "size": 123},
        {"id": 7, "scope": "runescape", "game": "runescape", "environment": "live",
         "builds": [], "timestamp": null}
    ]"#;

    #[test]
    fn test_parse_listing() {
        let caches: Vec<CacheDescriptor> = serde_json::from_str(LISTING).unwrap();
        assert_eq!(caches.len(), 2);
        assert_eq!(caches[0].builds, vec![Build { major: 221, minor: None }]);
        assert_eq!(caches[0].builds[0].to_string(), "221");
        assert_eq!(caches[1].timestamp, None);
    }

    #[test]
    fn test_snapshot_only_for_oldschool() {
        let caches: Vec<CacheDescriptor> = serde_json::from_str(LISTING).unwrap();
        assert_eq!(caches[0].snapshot(), Some(CacheSnapshot::osrs(1812)));
        assert_eq!(caches[1].snapshot(), None);
    }

    #[test]
    fn test_newer_ordering() {
        let caches: Vec<CacheDescriptor> = serde_json::from_str(LISTING).unwrap();
        assert!(caches[0].is_newer_than(&caches[1]));

        let mut same_time = caches[0].clone();
        same_time.id = 1813;
        assert!(same_time.is_newer_than(&caches[0]));
    }
}
