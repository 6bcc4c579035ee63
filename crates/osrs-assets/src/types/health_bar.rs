//! Health bar definitions (config archive 33)

use osrs_formats::{ArchiveId, ByteReader, FormatResult};
use serde::Serialize;

use super::unknown_opcode;
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthBar {
    pub id: u32,
    pub int1: u8,
    pub int2: u8,
    pub int3: i32,
    pub int4: u16,
    pub int5: u16,
    pub front_sprite: i32,
    pub back_sprite: i32,
    /// Width in pixels the bar is scaled to
    pub width: u8,
    pub width_padding: u8,
}

impl Decode for HealthBar {
    const KIND: &'static str = "health bar";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut bar = Self {
            id,
            int1: 255,
            int2: 255,
            int3: -1,
            int4: 70,
            int5: 1,
            front_sprite: -1,
            back_sprite: -1,
            width: 30,
            width_padding: 0,
        };
        loop {
            match reader.u8()? {
                0 => break,
                1 => {
                    reader.u16()?;
                }
                2 => bar.int1 = reader.u8()?,
                3 => bar.int2 = reader.u8()?,
                4 => bar.int3 = 0,
                5 => bar.int4 = reader.u16()?,
                6 => {
                    reader.u8()?;
                }
                7 => bar.front_sprite = reader.big_smart_n()?,
                8 => bar.back_sprite = reader.big_smart_n()?,
                11 => bar.int5 = reader.u16()?,
                14 => bar.width = reader.u8()?,
                15 => bar.width_padding = reader.u8()?,
                opcode => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(bar)
    }
}

impl Loadable for HealthBar {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(33),
    };
}
