use async_trait::async_trait;
use dashmap::DashMap;
use osrs_formats::{
    ArchiveData, ArchiveId, CacheVersion, IndexId, ReferenceTable, XteaKeyManager, container,
    name_hash,
};
use osrs_protocol::CacheSnapshot;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use super::{CacheProvider, GroupSource};
use crate::error::{CacheError, CacheResult};

/// Key to a shared, once-resolved lookup
///
/// A failed resolution leaves the cell empty so a later call can retry.
type Memo<K, V> = DashMap<K, Arc<OnceCell<Option<Arc<V>>>>>;

fn shared_cell<K, V>(memo: &Memo<K, V>, key: K) -> Arc<OnceCell<Option<Arc<V>>>>
where
    K: Eq + Hash,
{
    // The map guard must not be held across the await that resolves the cell
    Arc::clone(&memo.entry(key).or_default())
}

/// Provider core memoizing decoded tables and archives per instance
pub struct MemoizedProvider<S> {
    source: S,
    snapshot: CacheSnapshot,
    indices: Memo<IndexId, ReferenceTable>,
    archives: Memo<(IndexId, ArchiveId), ArchiveData>,
    keys: OnceCell<Arc<XteaKeyManager>>,
}

impl<S: GroupSource> MemoizedProvider<S> {
    /// Wrap a group source serving `snapshot`
    pub fn with_source(source: S, snapshot: CacheSnapshot) -> Self {
        Self {
            source,
            snapshot,
            indices: DashMap::new(),
            archives: DashMap::new(),
            keys: OnceCell::new(),
        }
    }

    /// Snapshot this provider serves
    pub fn snapshot(&self) -> &CacheSnapshot {
        &self.snapshot
    }

    /// Underlying group source
    pub fn source(&self) -> &S {
        &self.source
    }

    async fn load_index(&self, index: IndexId) -> CacheResult<Option<Arc<ReferenceTable>>> {
        let Some(raw) = self
            .source
            .read_group(IndexId::META, ArchiveId::from(index))
            .await?
        else {
            debug!("no reference table for index {}", index);
            return Ok(None);
        };
        let table = ReferenceTable::decode(&container::decompress(&raw)?)?;
        debug!(
            "decoded reference table for index {}: protocol {}, revision {}, {} archives",
            index,
            table.protocol,
            table.revision,
            table.len()
        );
        Ok(Some(Arc::new(table)))
    }

    async fn load_archive(
        &self,
        index: IndexId,
        archive: ArchiveId,
    ) -> CacheResult<Option<Arc<ArchiveData>>> {
        if index.is_meta() {
            let raw = self.source.read_group(index, archive).await?;
            return Ok(raw.map(|raw| Arc::new(ArchiveData::meta(archive, raw))));
        }

        let Some(table) = self.get_index(index).await? else {
            return Ok(None);
        };
        let Some(reference) = table.archive(archive) else {
            debug!("archive {}/{} not listed in reference table", index, archive);
            return Ok(None);
        };
        let raw = self.source.read_group(index, archive).await?;
        Ok(raw.map(|raw| Arc::new(ArchiveData::new(index, archive, raw, reference))))
    }
}

#[async_trait]
impl<S: GroupSource> CacheProvider for MemoizedProvider<S> {
    async fn get_index(&self, index: IndexId) -> CacheResult<Option<Arc<ReferenceTable>>> {
        if index.is_meta() {
            return Ok(None);
        }
        let cell = shared_cell(&self.indices, index);
        cell.get_or_try_init(|| self.load_index(index))
            .await
            .cloned()
    }

    async fn get_archives(&self, index: IndexId) -> CacheResult<Option<Vec<ArchiveId>>> {
        Ok(self
            .get_index(index)
            .await?
            .map(|table| table.archive_ids().collect()))
    }

    async fn get_archive(
        &self,
        index: IndexId,
        archive: ArchiveId,
    ) -> CacheResult<Option<Arc<ArchiveData>>> {
        let cell = shared_cell(&self.archives, (index, archive));
        cell.get_or_try_init(|| self.load_archive(index, archive))
            .await
            .cloned()
    }

    async fn get_archive_by_name(
        &self,
        index: IndexId,
        name: &str,
    ) -> CacheResult<Option<Arc<ArchiveData>>> {
        let Some(table) = self.get_index(index).await? else {
            return Ok(None);
        };
        let Some((archive, _)) = table.archive_by_name_hash(name_hash(name)) else {
            return Ok(None);
        };
        self.get_archive(index, archive).await
    }

    async fn get_version(&self, index: IndexId) -> CacheResult<CacheVersion> {
        let revision = self
            .get_index(index)
            .await?
            .map_or(0, |table| table.revision);
        Ok(CacheVersion {
            era: self.snapshot.era,
            index_revision: revision,
        })
    }

    async fn get_keys(&self) -> CacheResult<Arc<XteaKeyManager>> {
        self.keys
            .get_or_try_init(|| async {
                let keys = match self.source.read_keys().await? {
                    Some(json) => XteaKeyManager::from_json(&json)?,
                    None => XteaKeyManager::new(),
                };
                debug!("loaded {} XTEA keys", keys.len());
                Ok::<_, CacheError>(Arc::new(keys))
            })
            .await
            .cloned()
    }
}
