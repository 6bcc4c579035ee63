//! Floor overlay definitions (config archive 4)

use osrs_formats::{ArchiveId, ByteReader, FormatResult};
use serde::Serialize;

use super::unknown_opcode;
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Overlay {
    pub id: u32,
    pub color: u32,
    pub texture: i32,
    pub hide_underlay: bool,
    /// Colour shown on the minimap when it differs from `color`
    pub secondary_color: Option<u32>,
}

impl Decode for Overlay {
    const KIND: &'static str = "overlay";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut def = Self {
            id,
            color: 0,
            texture: -1,
            hide_underlay: true,
            secondary_color: None,
        };
        loop {
            match reader.u8()? {
                0 => break,
                1 => def.color = reader.u24()?,
                2 => def.texture = i32::from(reader.u8()?),
                5 => def.hide_underlay = false,
                7 => def.secondary_color = Some(reader.u24()?),
                opcode => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(def)
    }
}

impl Loadable for Overlay {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(4),
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_overlay() {
        let data = [1, 0x00, 0x00, 0xFF, 2, 4, 5, 7, 0x11, 0x22, 0x33, 0];
        let def = Overlay::decode(&mut ByteReader::new(&data), 6).unwrap();
        assert_eq!(
            def,
            Overlay {
                id: 6,
                color: 0xFF,
                texture: 4,
                hide_underlay: false,
                secondary_color: Some(0x112233),
            }
        );
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        assert!(Overlay::decode(&mut ByteReader::new(&[3, 0]), 6).is_err());
    }
}
