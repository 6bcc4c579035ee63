//! NPC definitions (config archive 9)

use osrs_formats::{ArchiveId, ByteReader, CacheVersion, FormatResult};
use serde::Serialize;

use super::{Replacement, Transforms, read_action, read_models, read_replacements, unknown_opcode};
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};
use crate::params::{Params, read_params};

/// First config index revision where opcode 102 carries a head icon bitfield
pub const HEAD_ICON_BITFIELD_SINCE: CacheVersion = CacheVersion::osrs(3_000);

/// Overhead icon: sprite archive and frame within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeadIcon {
    pub archive: i32,
    pub sprite: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Npc {
    pub id: u32,
    pub name: String,
    pub models: Vec<u16>,
    pub chathead_models: Vec<u16>,
    pub size: u8,
    pub standing_animation: i32,
    pub walking_animation: i32,
    pub rotate_left_animation: i32,
    pub rotate_right_animation: i32,
    pub rotate_180_animation: i32,
    pub rotate_90_left_animation: i32,
    pub rotate_90_right_animation: i32,
    pub run_animation: i32,
    pub category: Option<u16>,
    pub actions: [Option<String>; 5],
    pub recolors: Vec<Replacement>,
    pub retextures: Vec<Replacement>,
    /// Attack, defence, strength, hitpoints, ranged, magic
    pub stats: [u16; 6],
    pub minimap_visible: bool,
    pub combat_level: i32,
    pub width_scale: u16,
    pub height_scale: u16,
    pub render_priority: bool,
    pub ambient: i8,
    pub contrast: i8,
    /// Overhead icons; unset slots of the bitfield are `None`
    pub head_icons: Vec<Option<HeadIcon>>,
    pub rotation_speed: u16,
    pub transforms: Option<Transforms>,
    pub interactable: bool,
    pub rotation_flag: bool,
    pub follower: bool,
    pub params: Params,
}

impl Npc {
    fn new(id: u32) -> Self {
        Self {
            id,
            name: "null".to_string(),
            models: Vec::new(),
            chathead_models: Vec::new(),
            size: 1,
            standing_animation: -1,
            walking_animation: -1,
            rotate_left_animation: -1,
            rotate_right_animation: -1,
            rotate_180_animation: -1,
            rotate_90_left_animation: -1,
            rotate_90_right_animation: -1,
            run_animation: -1,
            category: None,
            actions: Default::default(),
            recolors: Vec::new(),
            retextures: Vec::new(),
            stats: [1; 6],
            minimap_visible: true,
            combat_level: -1,
            width_scale: 128,
            height_scale: 128,
            render_priority: false,
            ambient: 0,
            contrast: 0,
            head_icons: Vec::new(),
            rotation_speed: 32,
            transforms: None,
            interactable: true,
            rotation_flag: true,
            follower: false,
            params: Params::new(),
        }
    }
}

fn read_head_icons(reader: &mut ByteReader<'_>) -> FormatResult<Vec<Option<HeadIcon>>> {
    if !reader.is_after(HEAD_ICON_BITFIELD_SINCE) {
        let sprite = i32::from(reader.u16()?);
        return Ok(vec![Some(HeadIcon {
            archive: -1,
            sprite,
        })]);
    }

    let bitfield = reader.u8()?;
    let slots = u8::BITS - bitfield.leading_zeros();
    let mut icons = Vec::with_capacity(slots as usize);
    for slot in 0..slots {
        if bitfield & (1 << slot) == 0 {
            icons.push(None);
        } else {
            icons.push(Some(HeadIcon {
                archive: reader.big_smart_n()?,
                sprite: reader.smartm1()?,
            }));
        }
    }
    Ok(icons)
}

impl Decode for Npc {
    const KIND: &'static str = "npc";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut npc = Self::new(id);
        loop {
            let opcode = reader.u8()?;
            match opcode {
                0 => break,
                1 => npc.models = read_models(reader)?,
                2 => npc.name = reader.string()?,
                12 => npc.size = reader.u8()?,
                13 => npc.standing_animation = i32::from(reader.u16()?),
                14 => npc.walking_animation = i32::from(reader.u16()?),
                15 => npc.rotate_left_animation = i32::from(reader.u16()?),
                16 => npc.rotate_right_animation = i32::from(reader.u16()?),
                17 => {
                    npc.walking_animation = i32::from(reader.u16()?);
                    npc.rotate_180_animation = i32::from(reader.u16()?);
                    npc.rotate_90_left_animation = i32::from(reader.u16()?);
                    npc.rotate_90_right_animation = i32::from(reader.u16()?);
                }
                18 => npc.category = Some(reader.u16()?),
                30..=34 => npc.actions[usize::from(opcode - 30)] = read_action(reader)?,
                40 => npc.recolors = read_replacements(reader)?,
                41 => npc.retextures = read_replacements(reader)?,
                60 => npc.chathead_models = read_models(reader)?,
                74..=79 => npc.stats[usize::from(opcode - 74)] = reader.u16()?,
                93 => npc.minimap_visible = false,
                95 => npc.combat_level = i32::from(reader.u16()?),
                97 => npc.width_scale = reader.u16()?,
                98 => npc.height_scale = reader.u16()?,
                99 => npc.render_priority = true,
                100 => npc.ambient = reader.i8()?,
                101 => npc.contrast = reader.i8()?,
                102 => npc.head_icons = read_head_icons(reader)?,
                103 => npc.rotation_speed = reader.u16()?,
                106 => npc.transforms = Some(Transforms::read(reader, false)?),
                107 => npc.interactable = false,
                109 => npc.rotation_flag = false,
                111 => npc.follower = true,
                114 => npc.run_animation = i32::from(reader.u16()?),
                118 => npc.transforms = Some(Transforms::read(reader, true)?),
                249 => npc.params = read_params(reader)?,
                _ => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(npc)
    }
}

impl Loadable for Npc {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(9),
    };
}
