//! Floor underlay definitions (config archive 1)

use osrs_formats::{ArchiveId, ByteReader, FormatResult};
use serde::Serialize;

use super::unknown_opcode;
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Underlay {
    pub id: u32,
    /// 24-bit RGB
    pub color: u32,
}

impl Decode for Underlay {
    const KIND: &'static str = "underlay";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut def = Self { id, color: 0 };
        loop {
            match reader.u8()? {
                0 => break,
                1 => def.color = reader.u24()?,
                opcode => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(def)
    }
}

impl Loadable for Underlay {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(1),
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use osrs_formats::FormatError;

    #[test]
    fn test_decode_underlay() {
        let def = Underlay::decode(&mut ByteReader::new(&[1, 0x4A, 0x6B, 0x20, 0]), 3).unwrap();
        assert_eq!(def.color, 0x4A6B20);
        assert!(Underlay::decode(&mut ByteReader::new(&[2, 0]), 3).is_err());
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        let err = Underlay::decode(&mut ByteReader::new(&[9, 0]), 3).unwrap_err();
        assert!(matches!(
            err,
            FormatError::UnknownOpcode {
                kind: "underlay",
                opcode: 9
            }
        ));
    }
}
