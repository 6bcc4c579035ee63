//! In-memory archive fake and fixture encoders
//!
//! Used by this crate's tests and, through the `testing` feature, by
//! downstream crates that need a provider over hand-built cache data.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use flate2::Compression;
use flate2::write::GzEncoder;
use osrs_formats::{ArchiveId, IndexId};
use osrs_protocol::{ArchiveApi, CacheDescriptor, CacheSnapshot, ProtocolError};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wrap a payload in an uncompressed container
pub fn container_none(payload: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(payload.len() + 5);
    out.push(0);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    Bytes::from(out)
}

/// Encode a protocol 6 named reference table
///
/// Each archive is `(archive id, name hash, file ids)`; IDs must ascend.
/// CRCs are zero and every archive revision equals the table revision.
pub fn reference_table(revision: u32, archives: &[(u32, i32, Vec<u32>)]) -> Vec<u8> {
    let mut out = vec![6];
    out.extend_from_slice(&revision.to_be_bytes());
    out.push(0x01);
    out.extend_from_slice(&(archives.len() as u16).to_be_bytes());

    let mut previous = 0;
    for (id, ..) in archives {
        out.extend_from_slice(&((id - previous) as u16).to_be_bytes());
        previous = *id;
    }
    for (_, name_hash, _) in archives {
        out.extend_from_slice(&name_hash.to_be_bytes());
    }
    for _ in archives {
        out.extend_from_slice(&0u32.to_be_bytes());
    }
    for _ in archives {
        out.extend_from_slice(&revision.to_be_bytes());
    }
    for (.., files) in archives {
        out.extend_from_slice(&(files.len() as u16).to_be_bytes());
    }
    for (.., files) in archives {
        let mut previous = 0;
        for file in files {
            out.extend_from_slice(&((file - previous) as u16).to_be_bytes());
            previous = *file;
        }
    }
    for (.., files) in archives {
        for _ in files {
            out.extend_from_slice(&0i32.to_be_bytes());
        }
    }
    out
}

/// Pack files into a single-chunk archive payload
pub fn archive_payload(files: &[&[u8]]) -> Vec<u8> {
    if files.len() <= 1 {
        return files.first().map(|file| file.to_vec()).unwrap_or_default();
    }
    let mut out = Vec::new();
    for file in files {
        out.extend_from_slice(file);
    }
    let mut previous = 0i32;
    for file in files {
        let len = file.len() as i32;
        out.extend_from_slice(&(len - previous).to_be_bytes());
        previous = len;
    }
    out.push(1);
    out
}

/// Build a gzip-compressed tarball from `(path, content)` entries
pub fn flat_export(entries: &[(&str, &[u8])]) -> Bytes {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *data).unwrap();
    }
    Bytes::from(builder.into_inner().unwrap().finish().unwrap())
}

/// In-memory [`ArchiveApi`] recording every call
#[derive(Default)]
pub struct FakeArchive {
    caches: Mutex<Vec<CacheDescriptor>>,
    groups: DashMap<(IndexId, ArchiveId), Bytes>,
    group_calls: DashMap<(IndexId, ArchiveId), usize>,
    keys: Mutex<Option<Bytes>>,
    export: Mutex<Option<Bytes>>,
    list_calls: AtomicUsize,
    key_calls: AtomicUsize,
    failures: AtomicUsize,
    delay: Mutex<Duration>,
}

impl FakeArchive {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_group(&self, index: IndexId, group: ArchiveId, data: Bytes) {
        self.groups.insert((index, group), data);
    }

    /// Store a decompressed reference table as the meta group of `index`
    pub fn insert_table(&self, index: IndexId, table: &[u8]) {
        self.insert_group(IndexId::META, ArchiveId::from(index), container_none(table));
    }

    pub fn set_keys(&self, json: &[u8]) {
        *self.keys.lock().unwrap() = Some(Bytes::copy_from_slice(json));
    }

    pub fn set_export(&self, export: Bytes) {
        *self.export.lock().unwrap() = Some(export);
    }

    pub fn set_caches(&self, caches: Vec<CacheDescriptor>) {
        *self.caches.lock().unwrap() = caches;
    }

    /// Delay every group response, widening the window for concurrent callers
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Fail the next `count` group requests with a 503
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub fn group_calls(&self, index: IndexId, group: ArchiveId) -> usize {
        self.group_calls
            .get(&(index, group))
            .map_or(0, |calls| *calls)
    }

    pub fn total_group_calls(&self) -> usize {
        self.group_calls.iter().map(|entry| *entry.value()).sum()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn key_calls(&self) -> usize {
        self.key_calls.load(Ordering::SeqCst)
    }
}

fn not_found(what: &str) -> ProtocolError {
    ProtocolError::HttpStatus {
        status: 404,
        reason: "Not Found".to_string(),
        url: format!("fake://{what}"),
    }
}

#[async_trait]
impl ArchiveApi for FakeArchive {
    async fn list_caches(&self) -> osrs_protocol::Result<Vec<CacheDescriptor>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.caches.lock().unwrap().clone())
    }

    async fn group(
        &self,
        _snapshot: &CacheSnapshot,
        index: IndexId,
        group: ArchiveId,
    ) -> osrs_protocol::Result<Option<Bytes>> {
        *self.group_calls.entry((index, group)).or_insert(0) += 1;

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ProtocolError::HttpStatus {
                status: 503,
                reason: "Service Unavailable".to_string(),
                url: format!("fake://group/{index}/{group}"),
            });
        }

        Ok(self.groups.get(&(index, group)).map(|data| data.clone()))
    }

    async fn keys(&self, _snapshot: &CacheSnapshot) -> osrs_protocol::Result<Bytes> {
        self.key_calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().clone().ok_or_else(|| not_found("keys"))
    }

    async fn flat_export(&self, _snapshot: &CacheSnapshot) -> osrs_protocol::Result<Bytes> {
        self.export
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| not_found("flat.tar.gz"))
    }
}
