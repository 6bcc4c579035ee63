//! Cache providers
//!
//! Every provider answers the same six lookups over one snapshot. They differ
//! only in where raw group bytes come from:
//!
//! - [`RemoteProvider`]: the archive API, one request per group
//! - [`DiskProvider`]: a local directory of `index_{index}_{group}.dat` files
//! - [`HybridProvider`]: disk first, then remote with background write-back
//!
//! All three share [`MemoizedProvider`], which decodes reference tables and
//! wraps archives once per key and shares in-flight lookups between callers.

mod disk;
mod hybrid;
mod memo;
mod remote;

pub use disk::{DiskProvider, DiskStore, group_file_name};
pub use hybrid::{HybridProvider, HybridSource};
pub use memo::MemoizedProvider;
pub use remote::{RemoteProvider, RemoteSource};

use async_trait::async_trait;
use bytes::Bytes;
use osrs_formats::{ArchiveData, ArchiveId, CacheVersion, IndexId, ReferenceTable, XteaKeyManager};
use std::sync::Arc;

use crate::error::CacheResult;

/// Typed access to one cache snapshot
///
/// Repeated lookups of the same key return the same shared value. Absent
/// data is `Ok(None)`; errors mean the data exists but could not be read.
#[async_trait]
pub trait CacheProvider: Send + Sync {
    /// Reference table of a data index, `None` for the meta index or an absent index
    async fn get_index(&self, index: IndexId) -> CacheResult<Option<Arc<ReferenceTable>>>;

    /// Archive IDs of a data index, `None` for the meta index or an absent index
    async fn get_archives(&self, index: IndexId) -> CacheResult<Option<Vec<ArchiveId>>>;

    /// One archive, decompressed and split lazily on first file access
    async fn get_archive(
        &self,
        index: IndexId,
        archive: ArchiveId,
    ) -> CacheResult<Option<Arc<ArchiveData>>>;

    /// One archive looked up by its name
    async fn get_archive_by_name(
        &self,
        index: IndexId,
        name: &str,
    ) -> CacheResult<Option<Arc<ArchiveData>>>;

    /// Version stamp used to gate revision-dependent decoding
    async fn get_version(&self, index: IndexId) -> CacheResult<CacheVersion>;

    /// XTEA keys published with the snapshot, empty when none are stored
    async fn get_keys(&self) -> CacheResult<Arc<XteaKeyManager>>;
}

/// Raw byte source underneath [`MemoizedProvider`]
#[async_trait]
pub trait GroupSource: Send + Sync {
    /// Raw container bytes of one group, `None` when absent
    async fn read_group(&self, index: IndexId, group: ArchiveId) -> CacheResult<Option<Bytes>>;

    /// Raw `keys.json` document, `None` when absent
    async fn read_keys(&self) -> CacheResult<Option<Bytes>>;
}
