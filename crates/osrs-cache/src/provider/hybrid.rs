use async_trait::async_trait;
use bytes::Bytes;
use osrs_formats::{ArchiveId, IndexId};
use osrs_protocol::{ArchiveApi, CacheSnapshot};
use std::path::Path;
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::{DiskStore, GroupSource, MemoizedProvider, RemoteSource};
use crate::error::CacheResult;

/// Disk-first source that falls back to the network and writes misses back
///
/// Write-backs run in the background; a failed write only costs a future
/// cache hit and is logged. Disk read errors other than not-found are
/// treated as a miss.
pub struct HybridSource {
    disk: DiskStore,
    remote: RemoteSource,
    writes: TaskTracker,
}

impl HybridSource {
    pub fn new(disk: DiskStore, remote: RemoteSource) -> Self {
        Self {
            disk,
            remote,
            writes: TaskTracker::new(),
        }
    }

    pub fn disk(&self) -> &DiskStore {
        &self.disk
    }

    /// Number of write-backs still running
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Wait for every write-back issued so far
    pub async fn flush(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }

    fn write_back_group(&self, index: IndexId, group: ArchiveId, data: Bytes) {
        let disk = self.disk.clone();
        self.writes.spawn(async move {
            match disk.write_group(index, group, data).await {
                Ok(true) => debug!("wrote back group {}/{}", index, group),
                Ok(false) => {}
                Err(e) => warn!("write-back of group {}/{} failed: {}", index, group, e),
            }
        });
    }

    fn write_back_keys(&self, data: Bytes) {
        let disk = self.disk.clone();
        self.writes.spawn(async move {
            if let Err(e) = disk.write_keys(data).await {
                warn!("write-back of keys failed: {}", e);
            }
        });
    }
}

#[async_trait]
impl GroupSource for HybridSource {
    async fn read_group(&self, index: IndexId, group: ArchiveId) -> CacheResult<Option<Bytes>> {
        match self.disk.read_group(index, group).await {
            Ok(Some(data)) => return Ok(Some(data)),
            Ok(None) => {}
            Err(e) => warn!("disk read of group {}/{} failed, using remote: {}", index, group, e),
        }

        let data = self.remote.read_group(index, group).await?;
        if let Some(data) = &data {
            self.write_back_group(index, group, data.clone());
        }
        Ok(data)
    }

    async fn read_keys(&self) -> CacheResult<Option<Bytes>> {
        match self.disk.read_keys().await {
            Ok(Some(data)) => return Ok(Some(data)),
            Ok(None) => {}
            Err(e) => warn!("disk read of keys failed, using remote: {}", e),
        }

        let data = self.remote.read_keys().await?;
        if let Some(data) = &data {
            self.write_back_keys(data.clone());
        }
        Ok(data)
    }
}

/// Provider that converges toward a full local copy as it is used
pub type HybridProvider = MemoizedProvider<HybridSource>;

impl MemoizedProvider<HybridSource> {
    pub fn new(
        base_dir: impl AsRef<Path>,
        api: Arc<dyn ArchiveApi>,
        snapshot: CacheSnapshot,
    ) -> Self {
        let disk = DiskStore::new(base_dir, &snapshot);
        info!("hybrid provider for {} at {}", snapshot, disk.dir().display());
        let remote = RemoteSource::new(api, snapshot.clone());
        Self::with_source(HybridSource::new(disk, remote), snapshot)
    }

    /// Wait for pending write-backs to reach the disk
    pub async fn flush(&self) {
        self.source().flush().await;
    }
}
