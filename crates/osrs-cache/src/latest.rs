//! Latest snapshot resolution
//!
//! Finding the newest cache means downloading the archive's whole listing, so
//! the answer is remembered per game together with when it was checked. A
//! background check reuses it for an hour, an explicitly requested one for
//! five minutes. The store only throttles polling: losing it costs one extra
//! listing request.

use async_trait::async_trait;
use dashmap::DashMap;
use osrs_protocol::{ArchiveApi, CacheDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};

/// Remembered answer for one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestRecord {
    pub latest_cache_id: u32,
    /// Unix seconds of the listing request that produced this record
    pub last_checked_at: u64,
    pub cache: CacheDescriptor,
}

/// Get/set of the latest record per game
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, game: &str) -> Option<LatestRecord>;

    async fn set(&self, game: &str, record: LatestRecord) -> CacheResult<()>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    records: DashMap<String, LatestRecord>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get(&self, game: &str) -> Option<LatestRecord> {
        self.records.get(game).map(|record| record.clone())
    }

    async fn set(&self, game: &str, record: LatestRecord) -> CacheResult<()> {
        self.records.insert(game.to_string(), record);
        Ok(())
    }
}

/// Store persisted as one JSON object keyed by game
///
/// An unreadable or corrupt file reads as empty.
#[derive(Debug)]
pub struct JsonMetadataStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonMetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> HashMap<String, LatestRecord> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!("cannot read {}: {}", self.path.display(), e);
                return HashMap::new();
            }
        };
        serde_json::from_slice(&data).unwrap_or_else(|e| {
            warn!("ignoring corrupt metadata {}: {}", self.path.display(), e);
            HashMap::new()
        })
    }
}

#[async_trait]
impl MetadataStore for JsonMetadataStore {
    async fn get(&self, game: &str) -> Option<LatestRecord> {
        let _guard = self.lock.lock().await;
        self.load().await.remove(game)
    }

    async fn set(&self, game: &str, record: LatestRecord) -> CacheResult<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await;
        records.insert(game.to_string(), record);

        let json = serde_json::to_vec_pretty(&records)
            .map_err(|e| CacheError::Metadata(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

/// How eagerly to recheck the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Periodic check; tolerates an older answer
    Background,
    /// User-requested check; tolerates only a recent answer
    Forced,
}

/// Resolves the newest cache of a game, throttled by a [`MetadataStore`]
pub struct LatestCacheResolver {
    api: Arc<dyn ArchiveApi>,
    store: Arc<dyn MetadataStore>,
    background_refresh: Duration,
    forced_refresh: Duration,
}

impl LatestCacheResolver {
    pub fn new(api: Arc<dyn ArchiveApi>, store: Arc<dyn MetadataStore>, config: &CacheConfig) -> Self {
        Self {
            api,
            store,
            background_refresh: config.background_refresh,
            forced_refresh: config.forced_refresh,
        }
    }

    /// Newest cache of `game`, `None` when the archive lists none
    pub async fn resolve(&self, game: &str, mode: RefreshMode) -> CacheResult<Option<CacheDescriptor>> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        self.resolve_at(game, mode, now).await
    }

    /// [`resolve`](Self::resolve) against an explicit clock in Unix seconds
    pub async fn resolve_at(
        &self,
        game: &str,
        mode: RefreshMode,
        now: u64,
    ) -> CacheResult<Option<CacheDescriptor>> {
        let threshold = match mode {
            RefreshMode::Background => self.background_refresh,
            RefreshMode::Forced => self.forced_refresh,
        };

        let stored = self.store.get(game).await;
        if let Some(record) = &stored {
            let age = now.saturating_sub(record.last_checked_at);
            if age < threshold.as_secs() {
                debug!("latest {} cache {} checked {}s ago", game, record.latest_cache_id, age);
                return Ok(Some(record.cache.clone()));
            }
        }

        let caches = match self.api.list_caches().await {
            Ok(caches) => caches,
            Err(e) => match stored {
                Some(record) => {
                    warn!("cache listing failed, keeping cache {}: {}", record.latest_cache_id, e);
                    return Ok(Some(record.cache));
                }
                None => return Err(e.into()),
            },
        };

        let Some(latest) = newest(caches, game) else {
            warn!("archive lists no {} caches", game);
            return Ok(stored.map(|record| record.cache));
        };

        if stored
            .as_ref()
            .is_none_or(|record| record.latest_cache_id != latest.id)
        {
            info!("latest {} cache is {}", game, latest.id);
        }
        let record = LatestRecord {
            latest_cache_id: latest.id,
            last_checked_at: now,
            cache: latest.clone(),
        };
        if let Err(e) = self.store.set(game, record).await {
            warn!("cannot remember latest {} cache: {}", game, e);
        }
        Ok(Some(latest))
    }
}

/// Newest descriptor of `game` by timestamp, then ID
fn newest(caches: Vec<CacheDescriptor>, game: &str) -> Option<CacheDescriptor> {
    caches
        .into_iter()
        .filter(|cache| cache.game == game)
        .reduce(|best, cache| if cache.is_newer_than(&best) { cache } else { best })
}
