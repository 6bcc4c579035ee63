//! Big-endian byte cursor used by every cache decoder
//!
//! Besides fixed-width reads the cache uses a handful of variable-width
//! integer encodings:
//!
//! - **smart**: one byte when below 128, otherwise a u16 with the top bit as flag
//! - **big smart**: a u16 when the top bit is clear, otherwise a u32 with the flag masked
//! - **n-variants**: the all-ones pattern is reserved and decodes as `-1`
//!
//! Reading past the end of the buffer is always an error.

use crate::error::{FormatError, FormatResult};
use crate::version::CacheVersion;

/// CP1252 code points for bytes 0x80..=0x9F
///
/// The five bytes CP1252 leaves undefined decode as `?`, which is what the
/// game client renders for them.
const CP1252_HIGH: [char; 32] = [
    '\u{20ac}', '?', '\u{201a}', '\u{0192}', '\u{201e}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02c6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '?', '\u{017d}', '?', '?',
    '\u{2018}', '\u{2019}', '\u{201c}', '\u{201d}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02dc}', '\u{2122}', '\u{0161}', '\u{203a}', '\u{0153}', '?', '\u{017e}', '\u{0178}',
];

/// Cursor over a borrowed byte buffer
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
    version: Option<CacheVersion>,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            version: None,
        }
    }

    /// Attach the version of the cache the data was read from
    #[must_use]
    pub fn with_version(mut self, version: CacheVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Version attached to this reader, if any
    pub fn version(&self) -> Option<CacheVersion> {
        self.version
    }

    /// Whether the data is at least as new as `version`
    ///
    /// Readers without an attached version assume the latest layout.
    pub fn is_after(&self, version: CacheVersion) -> bool {
        self.version.is_none_or(|attached| attached >= version)
    }

    /// Current cursor position
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Move the cursor to an absolute position
    pub fn set_offset(&mut self, offset: usize) -> FormatResult<()> {
        if offset > self.data.len() {
            return Err(FormatError::UnexpectedEof {
                offset,
                wanted: 0,
                len: self.data.len(),
            });
        }
        self.offset = offset;
        Ok(())
    }

    /// Total buffer length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Read `n` raw bytes
    pub fn bytes(&mut self, n: usize) -> FormatResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(FormatError::UnexpectedEof {
                offset: self.offset,
                wanted: n,
                len: self.data.len(),
            })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// Skip `n` bytes
    pub fn skip(&mut self, n: usize) -> FormatResult<()> {
        self.bytes(n).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> FormatResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn peek(&self) -> FormatResult<u8> {
        self.data
            .get(self.offset)
            .copied()
            .ok_or(FormatError::UnexpectedEof {
                offset: self.offset,
                wanted: 1,
                len: self.data.len(),
            })
    }

    /// Unsigned byte
    pub fn u8(&mut self) -> FormatResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    /// Signed byte
    pub fn i8(&mut self) -> FormatResult<i8> {
        Ok(i8::from_be_bytes(self.array()?))
    }

    /// Unsigned big-endian 16-bit integer
    pub fn u16(&mut self) -> FormatResult<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    /// Signed big-endian 16-bit integer
    pub fn i16(&mut self) -> FormatResult<i16> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    /// Unsigned big-endian 24-bit integer
    pub fn u24(&mut self) -> FormatResult<u32> {
        let [a, b, c] = self.array()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }

    /// Unsigned big-endian 32-bit integer
    pub fn u32(&mut self) -> FormatResult<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    /// Signed big-endian 32-bit integer
    pub fn i32(&mut self) -> FormatResult<i32> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    /// Signed big-endian 64-bit integer
    pub fn i64(&mut self) -> FormatResult<i64> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    /// Unsigned byte, `0xFF` decodes as -1
    pub fn u8n(&mut self) -> FormatResult<i32> {
        Ok(match self.u8()? {
            u8::MAX => -1,
            v => i32::from(v),
        })
    }

    /// Unsigned 16-bit integer, `0xFFFF` decodes as -1
    pub fn u16n(&mut self) -> FormatResult<i32> {
        Ok(match self.u16()? {
            u16::MAX => -1,
            v => i32::from(v),
        })
    }

    /// Unsigned 24-bit integer, `0xFFFFFF` decodes as -1
    pub fn u24n(&mut self) -> FormatResult<i32> {
        Ok(match self.u24()? {
            0x00FF_FFFF => -1,
            v => v as i32,
        })
    }

    /// One byte below 128, otherwise a u16 with the flag bit removed
    pub fn smart(&mut self) -> FormatResult<u16> {
        if self.peek()? < 128 {
            Ok(u16::from(self.u8()?))
        } else {
            Ok(self.u16()? - 0x8000)
        }
    }

    /// [`smart`](Self::smart) minus one, so zero encodes -1
    pub fn smartm1(&mut self) -> FormatResult<i32> {
        Ok(i32::from(self.smart()?) - 1)
    }

    /// A u16 when the top bit is clear, otherwise a u32 with the top bit masked
    pub fn big_smart(&mut self) -> FormatResult<u32> {
        if self.peek()? & 0x80 == 0 {
            Ok(u32::from(self.u16()?))
        } else {
            Ok(self.u32()? & 0x7FFF_FFFF)
        }
    }

    /// [`big_smart`](Self::big_smart) where the short form `0x7FFF` decodes as -1
    pub fn big_smart_n(&mut self) -> FormatResult<i32> {
        if self.peek()? & 0x80 == 0 {
            Ok(match self.u16()? {
                0x7FFF => -1,
                v => i32::from(v),
            })
        } else {
            Ok((self.u32()? & 0x7FFF_FFFF) as i32)
        }
    }

    /// Zero-terminated CP1252 string
    pub fn string(&mut self) -> FormatResult<String> {
        let start = self.offset;
        let len = self.data[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(FormatError::UnexpectedEof {
                offset: start,
                wanted: self.data.len() - start + 1,
                len: self.data.len(),
            })?;
        let raw = self.bytes(len)?;
        self.offset += 1;
        Ok(raw.iter().map(|&b| decode_cp1252(b)).collect())
    }
}

fn decode_cp1252(byte: u8) -> char {
    match byte {
        0x80..=0x9F => CP1252_HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_width_reads() {
        let data = [
            0x01, 0xFF, 0x12, 0x34, 0xFF, 0xFE, 0x01, 0x02, 0x03, 0xDE, 0xAD, 0xBE, 0xEF,
        ];
        let mut r = ByteReader::new(&data);
        assert_eq!(r.u8().unwrap(), 1);
        assert_eq!(r.i8().unwrap(), -1);
        assert_eq!(r.u16().unwrap(), 0x1234);
        assert_eq!(r.i16().unwrap(), -2);
        assert_eq!(r.u24().unwrap(), 0x010203);
        assert_eq!(r.u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_i64() {
        let data = (-2i64).to_be_bytes();
        assert_eq!(ByteReader::new(&data).i64().unwrap(), -2);
    }

    #[test]
    fn test_read_past_end_is_fatal() {
        let mut r = ByteReader::new(&[0x01]);
        let err = r.u16().unwrap_err();
        assert!(matches!(
            err,
            FormatError::UnexpectedEof {
                offset: 0,
                wanted: 2,
                len: 1
            }
        ));
        // cursor did not move
        assert_eq!(r.offset(), 0);
    }

    #[test]
    fn test_smart_single_byte() {
        assert_eq!(ByteReader::new(&[0x00]).smart().unwrap(), 0);
        assert_eq!(ByteReader::new(&[0x7F]).smart().unwrap(), 127);
    }

    #[test]
    fn test_smart_two_bytes() {
        let mut r = ByteReader::new(&[0x81, 0x23]);
        assert_eq!(r.smart().unwrap(), 0x0123);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_smartm1() {
        assert_eq!(ByteReader::new(&[0x00]).smartm1().unwrap(), -1);
        assert_eq!(ByteReader::new(&[0x05]).smartm1().unwrap(), 4);
    }

    #[test]
    fn test_big_smart() {
        assert_eq!(ByteReader::new(&[0x12, 0x34]).big_smart().unwrap(), 0x1234);
        assert_eq!(
            ByteReader::new(&[0x80, 0x01, 0x00, 0x00])
                .big_smart()
                .unwrap(),
            0x0001_0000
        );
    }

    #[test]
    fn test_sentinel_reads() {
        assert_eq!(ByteReader::new(&[0xFF]).u8n().unwrap(), -1);
        assert_eq!(ByteReader::new(&[0xFF, 0xFF]).u16n().unwrap(), -1);
        assert_eq!(ByteReader::new(&[0xFF, 0xFE]).u16n().unwrap(), 0xFFFE);
        assert_eq!(ByteReader::new(&[0xFF, 0xFF, 0xFF]).u24n().unwrap(), -1);
        assert_eq!(ByteReader::new(&[0x7F, 0xFF]).big_smart_n().unwrap(), -1);
        assert_eq!(ByteReader::new(&[0x00, 0x10]).big_smart_n().unwrap(), 16);
    }

    #[test]
    fn test_string_ascii() {
        let mut r = ByteReader::new(b"Abyssal whip\0rest");
        assert_eq!(r.string().unwrap(), "Abyssal whip");
        assert_eq!(r.offset(), 13);
    }

    #[test]
    fn test_string_cp1252_high_range() {
        let mut r = ByteReader::new(&[0x80, 0x99, 0xE9, 0x81, 0x00]);
        assert_eq!(r.string().unwrap(), "\u{20ac}\u{2122}\u{e9}?");
    }

    #[test]
    fn test_unterminated_string_is_fatal() {
        let mut r = ByteReader::new(b"abc");
        assert!(matches!(
            r.string(),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_is_after_defaults_to_latest() {
        let r = ByteReader::new(&[]);
        assert!(r.is_after(CacheVersion::osrs(u32::MAX)));
    }

    #[test]
    fn test_is_after_with_version() {
        let r = ByteReader::new(&[]).with_version(CacheVersion::osrs(100));
        assert!(r.is_after(CacheVersion::osrs(99)));
        assert!(r.is_after(CacheVersion::osrs(100)));
        assert!(!r.is_after(CacheVersion::osrs(101)));
    }

    #[test]
    fn test_set_offset_bounds() {
        let mut r = ByteReader::new(&[1, 2, 3]);
        r.set_offset(3).unwrap();
        assert_eq!(r.remaining(), 0);
        assert!(r.set_offset(4).is_err());
    }

    proptest! {
        #[test]
        fn prop_smart_below_128_is_identity(b in 0u8..128) {
            prop_assert_eq!(ByteReader::new(&[b]).smart().unwrap(), u16::from(b));
        }

        #[test]
        fn prop_smart_wide_form_strips_flag(v in 0u16..0x8000) {
            let bytes = (v | 0x8000).to_be_bytes();
            prop_assert_eq!(ByteReader::new(&bytes).smart().unwrap(), v);
        }

        #[test]
        fn prop_big_smart_wide_form_masks_flag(v in 0u32..0x8000_0000) {
            let bytes = (v | 0x8000_0000).to_be_bytes();
            prop_assert_eq!(ByteReader::new(&bytes).big_smart().unwrap(), v);
        }
    }
}
