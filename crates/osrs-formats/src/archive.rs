//! Splitting archives into files
//!
//! An archive holding more than one file carries a footer after the file data:
//!
//! ```text
//! i32[chunks][files]  size deltas, chunk-major
//! u8                  chunk count
//! ```
//!
//! Within a chunk each file's length is the running sum of the deltas seen so
//! far in that chunk. The data region is laid out chunk-major as well, so a
//! file is the concatenation of its extents from every chunk.

use bytes::{Bytes, BytesMut};
use std::sync::OnceLock;

use crate::container;
use crate::error::{FormatError, FormatResult};
use crate::ids::{ArchiveId, FileId, IndexId};
use crate::reader::ByteReader;
use crate::reference_table::ArchiveReference;

/// Split a decompressed archive into `file_count` payloads
///
/// Archives with at most one file are returned unchanged. Payloads of a
/// single-chunk archive share the input buffer.
pub fn split_archive(data: Bytes, file_count: usize) -> FormatResult<Vec<Bytes>> {
    if file_count <= 1 {
        return Ok(vec![data]);
    }

    let chunks = usize::from(*data.last().ok_or_else(|| {
        FormatError::InvalidArchive(format!("empty archive declared {file_count} files"))
    })?);

    let footer_len = chunks
        .checked_mul(file_count)
        .and_then(|n| n.checked_mul(4))
        .and_then(|n| n.checked_add(1))
        .filter(|n| *n <= data.len())
        .ok_or_else(|| {
            FormatError::InvalidArchive(format!(
                "footer for {chunks} chunks of {file_count} files exceeds archive of {} bytes",
                data.len()
            ))
        })?;
    let data_len = data.len() - footer_len;

    // extents[chunk][file] = length of that file's extent in that chunk
    let mut footer = ByteReader::new(&data[data_len..]);
    let mut extents = Vec::with_capacity(chunks);
    for chunk in 0..chunks {
        let mut running: i64 = 0;
        let mut lengths = Vec::with_capacity(file_count);
        for file in 0..file_count {
            running += i64::from(footer.i32()?);
            let length = usize::try_from(running).map_err(|_| {
                FormatError::InvalidArchive(format!(
                    "negative length {running} for file {file} in chunk {chunk}"
                ))
            })?;
            lengths.push(length);
        }
        extents.push(lengths);
    }

    extents.iter().flatten().try_fold(0usize, |acc, len| {
        acc.checked_add(*len)
            .filter(|sum| *sum <= data_len)
            .ok_or_else(|| {
                FormatError::InvalidArchive(format!(
                    "file extents exceed data region of {data_len} bytes"
                ))
            })
    })?;

    if chunks == 1 {
        let mut offset = 0;
        return Ok(extents[0]
            .iter()
            .map(|len| {
                let file = data.slice(offset..offset + len);
                offset += len;
                file
            })
            .collect());
    }

    // Size every output first, then copy each (chunk, file) extent into place
    let mut files: Vec<BytesMut> = (0..file_count)
        .map(|file| BytesMut::with_capacity(extents.iter().map(|chunk| chunk[file]).sum()))
        .collect();
    let mut offset = 0;
    for chunk in &extents {
        for (file, len) in chunk.iter().enumerate() {
            files[file].extend_from_slice(&data[offset..offset + len]);
            offset += len;
        }
    }

    Ok(files.into_iter().map(BytesMut::freeze).collect())
}

/// One file of a split archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    /// File ID within the archive
    pub id: FileId,
    /// Hash of the file name, 0 when unnamed
    pub name_hash: i32,
    /// File content
    pub data: Bytes,
}

/// A fetched archive, decompressed and split on first access
///
/// Holds the raw container bytes and the file list from the reference table.
/// Splitting is deterministic, so the first successful split is kept for the
/// lifetime of the value.
#[derive(Debug)]
pub struct ArchiveData {
    index: IndexId,
    id: ArchiveId,
    revision: u32,
    raw: Bytes,
    refs: Vec<(FileId, i32)>,
    files: OnceLock<Vec<ArchiveFile>>,
}

impl ArchiveData {
    /// Wrap container bytes described by a reference table entry
    pub fn new(index: IndexId, id: ArchiveId, raw: Bytes, reference: &ArchiveReference) -> Self {
        Self {
            index,
            id,
            revision: reference.revision,
            raw,
            refs: reference
                .files
                .iter()
                .map(|(id, file)| (*id, file.name_hash))
                .collect(),
            files: OnceLock::new(),
        }
    }

    /// Wrap a meta index group, which always holds a single file 0
    pub fn meta(id: ArchiveId, raw: Bytes) -> Self {
        Self {
            index: IndexId::META,
            id,
            revision: 0,
            raw,
            refs: vec![(FileId(0), 0)],
            files: OnceLock::new(),
        }
    }

    /// Index the archive belongs to
    pub fn index(&self) -> IndexId {
        self.index
    }

    /// Archive ID
    pub fn id(&self) -> ArchiveId {
        self.id
    }

    /// Archive revision from the reference table
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Raw container bytes as stored in the cache
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Number of files the reference table lists
    pub fn file_count(&self) -> usize {
        self.refs.len()
    }

    /// Decompress and split, returning every file in ID order
    pub fn files(&self) -> FormatResult<&[ArchiveFile]> {
        if let Some(files) = self.files.get() {
            return Ok(files);
        }

        let payload = Bytes::from(container::decompress(&self.raw)?);
        let parts = split_archive(payload, self.refs.len())?;
        let files = self
            .refs
            .iter()
            .zip(parts)
            .map(|(&(id, name_hash), data)| ArchiveFile {
                id,
                name_hash,
                data,
            })
            .collect();

        // A racing caller may have stored an identical split first
        Ok(self.files.get_or_init(|| files))
    }

    /// Look up one file by ID
    pub fn file(&self, id: FileId) -> FormatResult<Option<&ArchiveFile>> {
        let files = self.files()?;
        Ok(files
            .binary_search_by_key(&id, |file| file.id)
            .ok()
            .map(|i| &files[i]))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::reference_table::FileReference;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    /// Lay files out over `chunks` chunks, splitting each file as evenly as possible
    fn encode(files: &[Vec<u8>], chunks: usize) -> Vec<u8> {
        let mut data = Vec::new();
        let mut footer = Vec::new();
        for chunk in 0..chunks {
            let mut previous = 0i32;
            for file in files {
                let per = file.len().div_ceil(chunks);
                let start = (chunk * per).min(file.len());
                let end = ((chunk + 1) * per).min(file.len());
                data.extend_from_slice(&file[start..end]);
                let len = (end - start) as i32;
                footer.extend_from_slice(&(len - previous).to_be_bytes());
                previous = len;
            }
        }
        data.extend_from_slice(&footer);
        data.push(chunks as u8);
        data
    }

    fn container(payload: &[u8]) -> Bytes {
        let mut out = vec![0];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        Bytes::from(out)
    }

    #[test]
    fn test_single_file_unchanged() {
        let data = Bytes::from_static(&[1, 2, 3, 4, 5]);
        assert_eq!(split_archive(data.clone(), 1).unwrap(), vec![data.clone()]);
        assert_eq!(split_archive(data.clone(), 0).unwrap(), vec![data]);
    }

    #[test]
    fn test_two_files_one_chunk() {
        let payload1 = b"abc".to_vec();
        let payload2 = b"defgh".to_vec();
        let (s1, s2) = (payload1.len() as i32, payload2.len() as i32);

        let mut data = Vec::new();
        data.extend_from_slice(&payload1);
        data.extend_from_slice(&payload2);
        data.extend_from_slice(&s1.to_be_bytes());
        data.extend_from_slice(&(s2 - s1).to_be_bytes());
        data.push(1);

        let files = split_archive(Bytes::from(data), 2).unwrap();
        assert_eq!(files, vec![Bytes::from(payload1), Bytes::from(payload2)]);
    }

    #[test]
    fn test_multi_chunk_reassembly() {
        let files = vec![b"first file".to_vec(), b"second".to_vec(), Vec::new()];
        let encoded = encode(&files, 3);
        let split = split_archive(Bytes::from(encoded), 3).unwrap();
        assert_eq!(
            split,
            files.into_iter().map(Bytes::from).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_footer_larger_than_archive() {
        let err = split_archive(Bytes::from_static(&[0, 0, 9]), 2).unwrap_err();
        assert!(matches!(err, FormatError::InvalidArchive(_)));
    }

    #[test]
    fn test_extents_beyond_data_region() {
        let mut data = vec![0xAA; 2];
        data.extend_from_slice(&10i32.to_be_bytes());
        data.extend_from_slice(&0i32.to_be_bytes());
        data.push(1);
        assert!(matches!(
            split_archive(Bytes::from(data), 2),
            Err(FormatError::InvalidArchive(_))
        ));
    }

    #[test]
    fn test_negative_length_rejected() {
        let mut data = Vec::new();
        data.extend_from_slice(&(-1i32).to_be_bytes());
        data.extend_from_slice(&0i32.to_be_bytes());
        data.push(1);
        assert!(matches!(
            split_archive(Bytes::from(data), 2),
            Err(FormatError::InvalidArchive(_))
        ));
    }

    #[test]
    fn test_archive_data_split_once() {
        let files = vec![b"one".to_vec(), b"two!".to_vec()];
        let reference = ArchiveReference {
            revision: 9,
            files: BTreeMap::from([
                (FileId(3), FileReference { name_hash: 30 }),
                (FileId(7), FileReference { name_hash: 70 }),
            ]),
            ..Default::default()
        };

        let archive = ArchiveData::new(
            IndexId(2),
            ArchiveId(10),
            container(&encode(&files, 1)),
            &reference,
        );
        assert_eq!(archive.file_count(), 2);
        assert_eq!(archive.revision(), 9);

        let first = archive.files().unwrap();
        assert_eq!(first[0].id, FileId(3));
        assert_eq!(first[1].name_hash, 70);
        assert_eq!(&first[1].data[..], b"two!");

        // Second access returns the stored split
        let second = archive.files().unwrap();
        assert!(std::ptr::eq(first, second));

        assert_eq!(&archive.file(FileId(3)).unwrap().unwrap().data[..], b"one");
        assert!(archive.file(FileId(4)).unwrap().is_none());
    }

    #[test]
    fn test_meta_archive_is_single_file() {
        let archive = ArchiveData::meta(ArchiveId(2), container(&[5, 0, 0, 0]));
        assert_eq!(archive.index(), IndexId::META);
        let files = archive.files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(&files[0].data[..], &[5, 0, 0, 0]);
    }

    proptest! {
        #[test]
        fn prop_split_recovers_files(
            files in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 2..6),
            chunks in 1usize..4,
        ) {
            let encoded = encode(&files, chunks);
            let split = split_archive(Bytes::from(encoded), files.len()).unwrap();
            let split: Vec<Vec<u8>> = split.into_iter().map(|b| b.to_vec()).collect();
            prop_assert_eq!(split, files);
        }
    }
}
