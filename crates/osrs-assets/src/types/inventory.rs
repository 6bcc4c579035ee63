//! Inventory definitions (config archive 5)

use osrs_formats::{ArchiveId, ByteReader, FormatResult};
use serde::Serialize;

use super::unknown_opcode;
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub id: u32,
    pub size: u16,
}

impl Decode for Inventory {
    const KIND: &'static str = "inventory";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut def = Self { id, size: 0 };
        loop {
            match reader.u8()? {
                0 => break,
                2 => def.size = reader.u16()?,
                opcode => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(def)
    }
}

impl Loadable for Inventory {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(5),
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use osrs_formats::FormatError;

    #[test]
    fn test_decode_inventory() {
        let def = Inventory::decode(&mut ByteReader::new(&[2, 0x00, 0x1C, 0]), 93).unwrap();
        assert_eq!(def.size, 28);
        assert!(Inventory::decode(&mut ByteReader::new(&[1, 0]), 93).is_err());
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        let err = Inventory::decode(&mut ByteReader::new(&[8, 0]), 3).unwrap_err();
        assert!(matches!(
            err,
            FormatError::UnknownOpcode {
                kind: "inventory",
                opcode: 8
            }
        ));
    }
}
