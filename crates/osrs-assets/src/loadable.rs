//! Loading decoded records through a [`CacheProvider`]
//!
//! Definitions are stored in one of two shapes:
//!
//! - **per archive**: every archive of an index is one record, held in file 0,
//!   and the record ID is the archive ID
//! - **per file**: one archive holds many records, and the record ID is the
//!   file ID; files that are empty or a single zero byte are unused slots
//!
//! Decoding is a pure function of the bytes and the index version; loading
//! composes it with provider lookups.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use osrs_cache::CacheProvider;
use osrs_formats::{ArchiveId, ByteReader, CacheVersion, FileId, FormatResult, IndexId};
use tracing::debug;

use crate::error::{AssetError, AssetResult};

/// Index holding the config definitions (items, NPCs, locations, ...)
pub const CONFIG_INDEX: IndexId = IndexId(2);

/// Index holding sprite sheets
pub const SPRITE_INDEX: IndexId = IndexId(8);

/// Archives fetched at once when loading a per-archive type in bulk
const FETCH_CONCURRENCY: usize = 16;

/// Where the records of one type live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One record per archive of `index`
    PerArchive { index: IndexId },
    /// One record per file of `archive` in `index`
    PerFile { index: IndexId, archive: ArchiveId },
}

impl Layout {
    pub const fn index(self) -> IndexId {
        match self {
            Self::PerArchive { index } | Self::PerFile { index, .. } => index,
        }
    }
}

/// A record decoded from its raw bytes
pub trait Decode: Sized {
    /// Name used in errors and logs
    const KIND: &'static str;

    /// Decode the record with the given ID
    ///
    /// Fails on any opcode the type does not define.
    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self>;
}

/// Whether a per-file slot holds no record
pub fn is_unused(data: &[u8]) -> bool {
    matches!(data, [] | [0])
}

/// Decode one record, annotating failures with its kind and ID
pub fn decode_record<T: Decode>(data: &[u8], id: u32, version: CacheVersion) -> AssetResult<T> {
    let mut reader = ByteReader::new(data).with_version(version);
    T::decode(&mut reader, id).map_err(|source| AssetError::Decode {
        kind: T::KIND,
        id,
        source,
    })
}

/// A record type with a fixed place in the cache
#[async_trait]
pub trait Loadable: Decode + Send + 'static {
    const LAYOUT: Layout;

    /// Load one record, `None` when it does not exist or is an unused slot
    async fn load(provider: &dyn CacheProvider, id: u32) -> AssetResult<Option<Self>> {
        let Some(data) = load_entry(provider, Self::LAYOUT, id).await? else {
            return Ok(None);
        };
        let version = provider.get_version(Self::LAYOUT.index()).await?;
        decode_record(&data, id, version).map(Some)
    }

    /// Load every record in ID order
    ///
    /// Stops at the first record that fails to decode.
    async fn load_all(provider: &dyn CacheProvider) -> AssetResult<Vec<Self>> {
        let version = provider.get_version(Self::LAYOUT.index()).await?;
        entries(provider, Self::LAYOUT)
            .await?
            .iter()
            .map(|(id, data)| decode_record(data, *id, version))
            .collect()
    }
}

/// Raw bytes of one record
pub async fn load_entry(
    provider: &dyn CacheProvider,
    layout: Layout,
    id: u32,
) -> AssetResult<Option<Bytes>> {
    match layout {
        Layout::PerArchive { index } => {
            let Some(archive) = provider.get_archive(index, ArchiveId(id)).await? else {
                return Ok(None);
            };
            Ok(archive.file(FileId(0))?.map(|file| file.data.clone()))
        }
        Layout::PerFile { index, archive } => {
            let Some(archive) = provider.get_archive(index, archive).await? else {
                return Ok(None);
            };
            Ok(archive
                .file(FileId(id))?
                .filter(|file| !is_unused(&file.data))
                .map(|file| file.data.clone()))
        }
    }
}

/// IDs and raw bytes of every record in ID order
pub async fn entries(provider: &dyn CacheProvider, layout: Layout) -> AssetResult<Vec<(u32, Bytes)>> {
    match layout {
        Layout::PerArchive { index } => {
            let ids = provider.get_archives(index).await?.unwrap_or_default();
            debug!("fetching {} archives of index {}", ids.len(), index);
            let archives: Vec<_> = stream::iter(ids)
                .map(|id| provider.get_archive(index, id))
                .buffered(FETCH_CONCURRENCY)
                .try_collect()
                .await?;

            let mut out = Vec::with_capacity(archives.len());
            for archive in archives.into_iter().flatten() {
                if let Some(file) = archive.file(FileId(0))? {
                    out.push((archive.id().0, file.data.clone()));
                }
            }
            Ok(out)
        }
        Layout::PerFile { index, archive } => {
            let Some(archive) = provider.get_archive(index, archive).await? else {
                return Ok(Vec::new());
            };
            Ok(archive
                .files()?
                .iter()
                .filter(|file| !is_unused(&file.data))
                .map(|file| (file.id.0, file.data.clone()))
                .collect())
        }
    }
}

/// IDs of every record in ID order
pub async fn record_ids(provider: &dyn CacheProvider, layout: Layout) -> AssetResult<Vec<u32>> {
    match layout {
        Layout::PerArchive { index } => Ok(provider
            .get_archives(index)
            .await?
            .unwrap_or_default()
            .into_iter()
            .map(|id| id.0)
            .collect()),
        Layout::PerFile { .. } => Ok(entries(provider, layout)
            .await?
            .into_iter()
            .map(|(id, _)| id)
            .collect()),
    }
}
