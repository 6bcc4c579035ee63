//! Bulk snapshot installation
//!
//! Seeds a disk store from the archive's flat export instead of fetching
//! groups one by one. The export is a gzip-compressed tarball with one entry
//! per group at `cache/<index>/<group>.dat`; each entry is written to the
//! store as it is read. Once the snapshot is in place every other snapshot
//! directory under the base directory is removed.

use bytes::Bytes;
use flate2::read::GzDecoder;
use osrs_formats::{ArchiveId, IndexId};
use osrs_protocol::{ArchiveApi, CacheSnapshot};
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{CacheError, CacheResult};
use crate::provider::DiskStore;

/// Counts from one install
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Groups newly written to disk
    pub written: usize,
    /// Groups already present and left untouched
    pub existing: usize,
    /// Tar entries that were not groups
    pub skipped: usize,
    /// Other snapshot directories removed
    pub evicted: usize,
}

/// Installs whole snapshots into a base directory
pub struct CacheInstaller {
    api: Arc<dyn ArchiveApi>,
    base_dir: PathBuf,
}

impl CacheInstaller {
    pub fn new(api: Arc<dyn ArchiveApi>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            base_dir: base_dir.into(),
        }
    }

    /// Directory the store for `snapshot` is installed to
    pub fn store(&self, snapshot: &CacheSnapshot) -> DiskStore {
        DiskStore::new(&self.base_dir, snapshot)
    }

    /// Fetch keys and the flat export, extract them, then evict other snapshots
    pub async fn install(&self, snapshot: &CacheSnapshot) -> CacheResult<InstallReport> {
        let store = self.store(snapshot);
        info!("installing {} to {}", snapshot, store.dir().display());

        let keys = self.api.keys(snapshot).await?;
        store.write_keys(keys).await?;
        debug!("stored keys for {}", snapshot);

        let export = self.api.flat_export(snapshot).await?;
        info!("downloaded flat export of {} ({} bytes)", snapshot, export.len());

        let extract_store = store.clone();
        let mut report =
            tokio::task::spawn_blocking(move || extract(&export, &extract_store)).await??;

        report.evicted = evict_others(&self.base_dir, store.dir()).await;
        info!(
            "installed {}: {} groups written, {} already present, {} entries skipped, {} snapshots evicted",
            snapshot, report.written, report.existing, report.skipped, report.evicted
        );
        Ok(report)
    }
}

/// Parse `cache/<index>/<group>.dat` into its address
fn group_address(path: &Path) -> Option<(IndexId, ArchiveId)> {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    let [.., "cache", index, file] = parts.as_slice() else {
        return None;
    };
    let group = file.strip_suffix(".dat")?;
    Some((IndexId(index.parse().ok()?), ArchiveId(group.parse().ok()?)))
}

fn extract(export: &Bytes, store: &DiskStore) -> CacheResult<InstallReport> {
    let mut archive = tar::Archive::new(GzDecoder::new(export.as_ref()));
    let mut report = InstallReport::default();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let path = entry.path()?.into_owned();
        let Some((index, group)) = group_address(&path) else {
            debug!("skipping export entry {}", path.display());
            report.skipped += 1;
            continue;
        };

        let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut data)?;
        if store.write_group_blocking(index, group, &data)? {
            report.written += 1;
        } else {
            report.existing += 1;
        }
    }

    if report.written + report.existing == 0 {
        return Err(CacheError::Install(
            "flat export contained no cache groups".to_string(),
        ));
    }
    Ok(report)
}

/// Remove every snapshot directory under `base_dir` except `keep`
///
/// Only directories named by a numeric snapshot ID are touched. Failures are
/// logged and skipped.
async fn evict_others(base_dir: &Path, keep: &Path) -> usize {
    let mut entries = match tokio::fs::read_dir(base_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot list {} for eviction: {}", base_dir.display(), e);
            return 0;
        }
    };

    let mut evicted = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("eviction listing of {} failed: {}", base_dir.display(), e);
                break;
            }
        };
        let path = entry.path();
        let is_snapshot = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.parse::<u32>().is_ok());
        let is_dir = entry.file_type().await.is_ok_and(|kind| kind.is_dir());
        if !is_snapshot || !is_dir || path == keep {
            continue;
        }
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {
                info!("evicted old snapshot {}", path.display());
                evicted += 1;
            }
            Err(e) => warn!("failed to evict {}: {}", path.display(), e),
        }
    }
    evicted
}
