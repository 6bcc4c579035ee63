use async_trait::async_trait;
use bytes::Bytes;
use osrs_formats::{ArchiveId, IndexId};
use osrs_protocol::CacheSnapshot;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use super::{GroupSource, MemoizedProvider};
use crate::error::CacheResult;

const KEYS_FILE: &str = "keys.json";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File name of one group inside a snapshot directory
pub fn group_file_name(index: IndexId, group: ArchiveId) -> String {
    format!("index_{}_{}.dat", index.0, group.0)
}

/// One snapshot's directory of raw group files
///
/// Entries are written once and never overwritten.
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Store for `snapshot` under `base_dir/<snapshot id>`
    pub fn new(base_dir: impl AsRef<Path>, snapshot: &CacheSnapshot) -> Self {
        Self {
            dir: base_dir.as_ref().join(snapshot.id.to_string()),
        }
    }

    /// Snapshot directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn group_path(&self, index: IndexId, group: ArchiveId) -> PathBuf {
        self.dir.join(group_file_name(index, group))
    }

    pub fn keys_path(&self) -> PathBuf {
        self.dir.join(KEYS_FILE)
    }

    /// Persist a group unless it is already stored; returns whether it was written
    pub async fn write_group(
        &self,
        index: IndexId,
        group: ArchiveId,
        data: Bytes,
    ) -> CacheResult<bool> {
        let path = self.group_path(index, group);
        Ok(tokio::task::spawn_blocking(move || write_new(&path, &data)).await??)
    }

    /// Blocking variant of [`write_group`](Self::write_group) for use off the runtime
    pub fn write_group_blocking(
        &self,
        index: IndexId,
        group: ArchiveId,
        data: &[u8],
    ) -> io::Result<bool> {
        write_new(&self.group_path(index, group), data)
    }

    /// Persist the key document unless one is already stored
    pub async fn write_keys(&self, data: Bytes) -> CacheResult<bool> {
        let path = self.keys_path();
        Ok(tokio::task::spawn_blocking(move || write_new(&path, &data)).await??)
    }

    async fn read(&self, path: PathBuf) -> CacheResult<Option<Bytes>> {
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `data` to `path` unless the file exists; returns whether it was written
///
/// The content goes to a uniquely named temporary file first and is linked
/// into place, so readers never observe a partial file and a concurrent
/// writer of the same entry cannot clobber it.
fn write_new(path: &Path, data: &[u8]) -> io::Result<bool> {
    if path.try_exists()? {
        return Ok(false);
    }
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = dir.join(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(data)?;
        file.flush()?;
    }

    let linked = match fs::hard_link(&temp_path, path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        // Filesystems without hard links fall back to a checked rename
        Err(_) if !path.try_exists()? => fs::rename(&temp_path, path).map(|()| true),
        Err(_) => Ok(false),
    };
    if temp_path.exists() {
        let _ = fs::remove_file(&temp_path);
    }
    linked
}

#[async_trait]
impl GroupSource for DiskStore {
    async fn read_group(&self, index: IndexId, group: ArchiveId) -> CacheResult<Option<Bytes>> {
        let data = self.read(self.group_path(index, group)).await?;
        debug!(
            "disk {} for group {}/{}",
            if data.is_some() { "hit" } else { "miss" },
            index,
            group
        );
        Ok(data)
    }

    async fn read_keys(&self) -> CacheResult<Option<Bytes>> {
        self.read(self.keys_path()).await
    }
}

/// Provider reading a locally installed snapshot; never touches the network
pub type DiskProvider = MemoizedProvider<DiskStore>;

impl MemoizedProvider<DiskStore> {
    pub fn new(base_dir: impl AsRef<Path>, snapshot: CacheSnapshot) -> Self {
        let store = DiskStore::new(base_dir, &snapshot);
        info!("disk provider for {} at {}", snapshot, store.dir().display());
        Self::with_source(store, snapshot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::provider::CacheProvider;
    use crate::testing::{container_none, reference_table};
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let store = DiskStore::new("/data", &CacheSnapshot::osrs(1812));
        assert_eq!(store.dir(), Path::new("/data/1812"));
        assert_eq!(
            store.group_path(IndexId(255), ArchiveId(2)),
            Path::new("/data/1812/index_255_2.dat")
        );
        assert_eq!(store.keys_path(), Path::new("/data/1812/keys.json"));
    }

    #[test]
    fn test_write_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("index_2_10.dat");

        assert!(write_new(&path, b"first").unwrap());
        assert!(!write_new(&path, b"second").unwrap());
        assert_eq!(fs::read(&path).unwrap(), b"first");

        // Only the entry remains, no temporary files
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_entries_are_absent() {
        let temp = TempDir::new().unwrap();
        let provider = DiskProvider::new(temp.path(), CacheSnapshot::osrs(3));

        assert!(provider.get_index(IndexId(2)).await.unwrap().is_none());
        assert!(
            provider
                .get_archive(IndexId(2), ArchiveId(0))
                .await
                .unwrap()
                .is_none()
        );
        assert!(provider.get_keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_written_groups() {
        let temp = TempDir::new().unwrap();
        let snapshot = CacheSnapshot::osrs(3);
        let store = DiskStore::new(temp.path(), &snapshot);
        store
            .write_group(
                IndexId::META,
                ArchiveId(2),
                container_none(&reference_table(4, &[(6, 0, vec![0])])),
            )
            .await
            .unwrap();
        store
            .write_group(IndexId(2), ArchiveId(6), container_none(b"loc"))
            .await
            .unwrap();

        let provider = DiskProvider::new(temp.path(), snapshot);
        let archive = provider
            .get_archive(IndexId(2), ArchiveId(6))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&archive.files().unwrap()[0].data[..], b"loc");
    }
}
