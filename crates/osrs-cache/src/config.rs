//! Cache configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where snapshots live on disk and how often the latest snapshot is rechecked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Base directory; each snapshot gets a subdirectory named by its ID
    pub cache_dir: PathBuf,

    /// Minimum age of the stored "latest cache" record before a background check
    pub background_refresh: Duration,

    /// Minimum age before an explicitly requested check hits the network
    pub forced_refresh: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("osrs-cache"),
            background_refresh: Duration::from_secs(60 * 60),
            forced_refresh: Duration::from_secs(5 * 60),
        }
    }
}

impl CacheConfig {
    /// Configuration rooted at `cache_dir` with default refresh thresholds
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: std::env::var("OSRS_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            background_refresh: std::env::var("OSRS_BACKGROUND_REFRESH")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.background_refresh, Duration::from_secs),
            forced_refresh: std::env::var("OSRS_FORCED_REFRESH")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(defaults.forced_refresh, Duration::from_secs),
        }
    }

    /// File holding the latest-cache records
    pub fn metadata_path(&self) -> PathBuf {
        self.cache_dir.join("latest.json")
    }
}
