//! Varbit definitions (config archive 14)

use osrs_formats::{ArchiveId, ByteReader, FormatResult};
use serde::Serialize;

use super::unknown_opcode;
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};

/// A bit range of a player variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Varbit {
    pub id: u32,
    pub varp: u16,
    pub least_significant_bit: u8,
    pub most_significant_bit: u8,
}

impl Varbit {
    /// Extract this varbit's value from the varp's value
    pub fn extract(&self, varp_value: i32) -> i32 {
        let width = u32::from(self.most_significant_bit.saturating_sub(self.least_significant_bit)) + 1;
        let mask = if width >= 32 { u32::MAX } else { (1 << width) - 1 };
        ((varp_value as u32 >> self.least_significant_bit.min(31)) & mask) as i32
    }
}

impl Decode for Varbit {
    const KIND: &'static str = "varbit";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut def = Self {
            id,
            varp: 0,
            least_significant_bit: 0,
            most_significant_bit: 0,
        };
        loop {
            match reader.u8()? {
                0 => break,
                1 => {
                    def.varp = reader.u16()?;
                    def.least_significant_bit = reader.u8()?;
                    def.most_significant_bit = reader.u8()?;
                }
                opcode => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(def)
    }
}

impl Loadable for Varbit {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(14),
    };
}
