//! Container (compression envelope) decoding
//!
//! Every group in the cache is wrapped in a container:
//!
//! ```text
//! u8   compression type (0 none, 1 bzip2, 2 gzip)
//! u32  compressed length
//! u32  decompressed length   (compressed types only)
//! ...  payload
//! ```
//!
//! Bzip2 payloads are stored without the `BZh1` stream magic; it is restored
//! before the payload reaches the decoder. Any bytes after the payload (the
//! optional trailing revision) are ignored.

use binrw::{BinRead, io::Cursor};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::io::Read;

use crate::error::{FormatError, FormatResult};

/// Stream magic stripped from stored bzip2 payloads (block size 100k)
const BZIP2_MAGIC: [u8; 4] = *b"BZh1";

/// Maximum allowed decompression size (256 MB)
///
/// The largest OSRS groups are a few megabytes; the limit rejects corrupt
/// length fields before they turn into huge allocations.
pub const MAX_DECOMPRESSION_SIZE: usize = 256 * 1024 * 1024;

/// Container compression type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionType {
    /// Payload stored verbatim
    None = 0,
    /// Headerless bzip2 stream
    Bzip2 = 1,
    /// Gzip member
    Gzip = 2,
}

impl CompressionType {
    /// Parse from the container's type byte
    pub fn from_byte(byte: u8) -> FormatResult<Self> {
        match byte {
            0 => Ok(Self::None),
            1 => Ok(Self::Bzip2),
            2 => Ok(Self::Gzip),
            other => Err(FormatError::UnknownCompression(other)),
        }
    }

    /// Size of the header preceding the payload
    pub const fn header_size(self) -> usize {
        match self {
            Self::None => 5,
            Self::Bzip2 | Self::Gzip => 9,
        }
    }
}

/// Fixed part of the container header
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead)]
#[br(big)]
pub struct ContainerHeader {
    /// Raw compression type byte
    pub compression: u8,
    /// Length of the compressed payload
    pub compressed_len: u32,
    /// Length after decompression (absent for uncompressed containers)
    #[br(if(compression != 0))]
    pub decompressed_len: Option<u32>,
}

impl ContainerHeader {
    /// Parse the header at the start of `data`
    pub fn parse(data: &[u8]) -> FormatResult<Self> {
        if data.is_empty() {
            return Err(FormatError::InvalidContainer(
                "container is empty".to_string(),
            ));
        }
        let kind = CompressionType::from_byte(data[0])?;
        if data.len() < kind.header_size() {
            return Err(FormatError::InvalidContainer(format!(
                "header needs {} bytes, container has {}",
                kind.header_size(),
                data.len()
            )));
        }
        Ok(Self::read(&mut Cursor::new(data))?)
    }

    /// Compression type of this container
    pub fn compression_type(&self) -> FormatResult<CompressionType> {
        CompressionType::from_byte(self.compression)
    }
}

/// Strip the container envelope and return the decompressed payload
pub fn decompress(data: &[u8]) -> FormatResult<Vec<u8>> {
    let header = ContainerHeader::parse(data)?;
    let kind = header.compression_type()?;
    let start = kind.header_size();
    let end = start
        .checked_add(header.compressed_len as usize)
        .filter(|end| *end <= data.len())
        .ok_or_else(|| {
            FormatError::InvalidContainer(format!(
                "compressed length {} exceeds container of {} bytes",
                header.compressed_len,
                data.len()
            ))
        })?;
    let payload = &data[start..end];

    match (kind, header.decompressed_len) {
        (CompressionType::None, _) => Ok(payload.to_vec()),
        (CompressionType::Gzip, Some(expected)) => {
            inflate(GzDecoder::new(payload), expected as usize, "gzip")
        }
        (CompressionType::Bzip2, Some(expected)) => {
            let mut stream = Vec::with_capacity(BZIP2_MAGIC.len() + payload.len());
            stream.extend_from_slice(&BZIP2_MAGIC);
            stream.extend_from_slice(payload);
            inflate(BzDecoder::new(stream.as_slice()), expected as usize, "bzip2")
        }
        (_, None) => Err(FormatError::InvalidContainer(
            "missing decompressed length".to_string(),
        )),
    }
}

fn inflate(decoder: impl Read, expected: usize, codec: &str) -> FormatResult<Vec<u8>> {
    if expected > MAX_DECOMPRESSION_SIZE {
        return Err(FormatError::Decompression(format!(
            "{codec} decompressed length {expected} exceeds limit of {MAX_DECOMPRESSION_SIZE} bytes"
        )));
    }

    let mut out = Vec::with_capacity(expected);
    // One extra byte so an overlong stream is detected rather than truncated
    decoder
        .take(expected as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| FormatError::Decompression(format!("{codec}: {e}")))?;

    if out.len() != expected {
        return Err(FormatError::Decompression(format!(
            "{codec} size mismatch: header says {expected}, stream produced {}",
            out.len()
        )));
    }
    Ok(out)
}
