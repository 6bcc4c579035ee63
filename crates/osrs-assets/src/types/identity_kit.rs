//! Identity kit definitions (config archive 3)
//!
//! Body parts a player model can be built from.

use osrs_formats::{ArchiveId, ByteReader, FormatResult};
use serde::Serialize;

use super::{Replacement, read_models, read_replacements, unknown_opcode};
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityKit {
    pub id: u32,
    pub body_part: i32,
    pub models: Vec<u16>,
    pub selectable: bool,
    pub recolors: Vec<Replacement>,
    pub retextures: Vec<Replacement>,
    pub chathead_models: [i32; 10],
}

impl Decode for IdentityKit {
    const KIND: &'static str = "identity kit";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut kit = Self {
            id,
            body_part: -1,
            models: Vec::new(),
            selectable: true,
            recolors: Vec::new(),
            retextures: Vec::new(),
            chathead_models: [-1; 10],
        };
        loop {
            let opcode = reader.u8()?;
            match opcode {
                0 => break,
                1 => kit.body_part = i32::from(reader.u8()?),
                2 => kit.models = read_models(reader)?,
                3 => kit.selectable = false,
                40 => kit.recolors = read_replacements(reader)?,
                41 => kit.retextures = read_replacements(reader)?,
                60..=69 => {
                    kit.chathead_models[usize::from(opcode - 60)] = i32::from(reader.u16()?);
                }
                _ => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(kit)
    }
}

impl Loadable for IdentityKit {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(3),
    };
}
