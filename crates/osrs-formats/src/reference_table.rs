//! Reference table (per-index directory) decoding
//!
//! A reference table is the decompressed content of archive `i` of the meta
//! index and describes every archive of index `i`. IDs are stored as
//! delta runs; every other column follows in a fixed order:
//!
//! ```text
//! u8      protocol (5..=7)
//! u32     revision                 protocol >= 6
//! u8      flags
//! count   archive count            u16 below protocol 7, big smart otherwise
//! delta*  archive ID deltas
//! i32*    archive name hashes      flag bit 0
//! u32*    archive CRCs
//! [8]*    reserved block           flag bit 2
//! [64]*   digests                  flag bit 1
//! [4]*    reserved block           flag bit 3
//! u32*    archive revisions
//! count*  file counts
//! delta** file ID deltas
//! i32**   file name hashes         flag bit 0
//! ```

use std::collections::BTreeMap;

use crate::error::{FormatError, FormatResult};
use crate::ids::{ArchiveId, FileId};
use crate::reader::ByteReader;

const FLAG_NAMED: u8 = 0x01;
const FLAG_DIGESTS: u8 = 0x02;
const FLAG_RESERVED_8: u8 = 0x04;
const FLAG_RESERVED_4: u8 = 0x08;

const DIGEST_LEN: usize = 64;

/// One file inside an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileReference {
    /// Hash of the file name, 0 when the table is unnamed
    pub name_hash: i32,
}

/// One archive of an index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveReference {
    /// Hash of the archive name, 0 when the table is unnamed
    pub name_hash: i32,
    /// Stored CRC32 of the container (not verified)
    pub crc: u32,
    /// Archive revision
    pub revision: u32,
    /// Files of the archive keyed by file ID
    pub files: BTreeMap<FileId, FileReference>,
}

impl ArchiveReference {
    /// Number of files in the archive
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// File IDs in ascending order
    pub fn file_ids(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files.keys().copied()
    }
}

/// Decoded directory of one index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferenceTable {
    /// Format protocol (5, 6 or 7)
    pub protocol: u8,
    /// Table revision, 0 below protocol 6
    pub revision: u32,
    /// Whether name hashes are present
    pub named: bool,
    /// Archives keyed by archive ID
    pub archives: BTreeMap<ArchiveId, ArchiveReference>,
}

impl ReferenceTable {
    /// Decode a decompressed reference table
    pub fn decode(data: &[u8]) -> FormatResult<Self> {
        let mut reader = ByteReader::new(data);

        let protocol = reader.u8()?;
        if !(5..=7).contains(&protocol) {
            return Err(FormatError::UnsupportedProtocol(protocol));
        }
        let revision = if protocol >= 6 { reader.u32()? } else { 0 };

        let flags = reader.u8()?;
        let named = flags & FLAG_NAMED != 0;
        let wide = protocol >= 7;

        let archive_count = read_count(&mut reader, wide)?;
        let archive_ids = read_ids(&mut reader, archive_count, wide, "archive")?;

        // Counts come off the wire; bound preallocation by what the buffer can hold
        let capacity = archive_count.min(reader.remaining());

        let mut name_hashes = Vec::with_capacity(capacity);
        for _ in 0..archive_count {
            name_hashes.push(if named { reader.i32()? } else { 0 });
        }

        let mut crcs = Vec::with_capacity(capacity);
        for _ in 0..archive_count {
            crcs.push(reader.u32()?);
        }

        if flags & FLAG_RESERVED_8 != 0 {
            reader.skip(archive_count.saturating_mul(8))?;
        }
        if flags & FLAG_DIGESTS != 0 {
            reader.skip(archive_count.saturating_mul(DIGEST_LEN))?;
        }
        if flags & FLAG_RESERVED_4 != 0 {
            reader.skip(archive_count.saturating_mul(4))?;
        }

        let mut revisions = Vec::with_capacity(capacity);
        for _ in 0..archive_count {
            revisions.push(reader.u32()?);
        }

        let mut file_counts = Vec::with_capacity(capacity);
        for _ in 0..archive_count {
            file_counts.push(read_count(&mut reader, wide)?);
        }

        let mut file_ids = Vec::with_capacity(capacity);
        for &count in &file_counts {
            file_ids.push(read_ids(&mut reader, count, wide, "file")?);
        }

        let mut archives = BTreeMap::new();
        for (i, id) in archive_ids.into_iter().enumerate() {
            let mut files = BTreeMap::new();
            for &file in &file_ids[i] {
                let name_hash = if named { reader.i32()? } else { 0 };
                files.insert(FileId(file), FileReference { name_hash });
            }
            archives.insert(
                ArchiveId(id),
                ArchiveReference {
                    name_hash: name_hashes[i],
                    crc: crcs[i],
                    revision: revisions[i],
                    files,
                },
            );
        }

        Ok(Self {
            protocol,
            revision,
            named,
            archives,
        })
    }

    /// Look up an archive by ID
    pub fn archive(&self, id: ArchiveId) -> Option<&ArchiveReference> {
        self.archives.get(&id)
    }

    /// Find the archive whose name hash matches
    pub fn archive_by_name_hash(&self, hash: i32) -> Option<(ArchiveId, &ArchiveReference)> {
        if !self.named {
            return None;
        }
        self.archives
            .iter()
            .find(|(_, archive)| archive.name_hash == hash)
            .map(|(id, archive)| (*id, archive))
    }

    /// Archive IDs in ascending order
    pub fn archive_ids(&self) -> impl Iterator<Item = ArchiveId> + '_ {
        self.archives.keys().copied()
    }

    /// Number of archives in the index
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    /// Whether the index has no archives
    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }
}

fn read_count(reader: &mut ByteReader<'_>, wide: bool) -> FormatResult<usize> {
    Ok(if wide {
        reader.big_smart()? as usize
    } else {
        usize::from(reader.u16()?)
    })
}

/// Decode `count` delta-encoded IDs into absolute, strictly increasing IDs
fn read_ids(
    reader: &mut ByteReader<'_>,
    count: usize,
    wide: bool,
    what: &'static str,
) -> FormatResult<Vec<u32>> {
    let mut ids = Vec::with_capacity(count.min(reader.remaining()));
    let mut current: u32 = 0;
    for i in 0..count {
        let delta = if wide {
            reader.big_smart()?
        } else {
            u32::from(reader.u16()?)
        };
        let next = current.checked_add(delta).ok_or_else(|| {
            FormatError::InvalidArchive(format!("{what} ID overflows after {current}"))
        })?;
        if i > 0 && next <= current {
            return Err(FormatError::NonIncreasingId {
                what,
                previous: current,
                next,
            });
        }
        ids.push(next);
        current = next;
    }
    Ok(ids)
}
