//! Item definitions (config archive 10)

use osrs_formats::{ArchiveId, ByteReader, FormatResult};
use serde::Serialize;
use std::collections::BTreeMap;

use super::{Replacement, read_action, read_replacements, unknown_opcode};
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};
use crate::params::{Params, read_params};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: u32,
    pub name: String,
    pub examine: Option<String>,
    pub inventory_model: u16,
    pub zoom_2d: u16,
    pub x_angle_2d: u16,
    pub y_angle_2d: u16,
    pub z_angle_2d: u16,
    pub x_offset_2d: i16,
    pub y_offset_2d: i16,
    pub stackable: bool,
    pub cost: i32,
    pub members: bool,
    pub tradeable: bool,
    pub weight: i16,
    pub category: Option<u16>,
    pub wear_pos: [i32; 3],
    pub male_models: [i32; 3],
    pub male_offset: u8,
    pub female_models: [i32; 3],
    pub female_offset: u8,
    pub male_head_models: [i32; 2],
    pub female_head_models: [i32; 2],
    /// Ground menu options
    pub options: [Option<String>; 5],
    /// Inventory menu options
    pub interface_options: [Option<String>; 5],
    /// Nested inventory options, keyed by sub-option slot under each option
    pub sub_options: [BTreeMap<u8, String>; 5],
    pub shift_click_drop_index: i8,
    pub recolors: Vec<Replacement>,
    pub retextures: Vec<Replacement>,
    pub noted_id: i32,
    pub noted_template: i32,
    /// Item shown for larger stack sizes: `(item, minimum count)`
    pub count_variants: Vec<(u16, u16)>,
    pub resize: [u16; 3],
    pub ambient: i8,
    pub contrast: i8,
    pub team: u8,
    pub bought_id: i32,
    pub bought_template: i32,
    pub placeholder_id: i32,
    pub placeholder_template: i32,
    pub params: Params,
}

impl Item {
    fn new(id: u32) -> Self {
        Self {
            id,
            name: "null".to_string(),
            examine: None,
            inventory_model: 0,
            zoom_2d: 2000,
            x_angle_2d: 0,
            y_angle_2d: 0,
            z_angle_2d: 0,
            x_offset_2d: 0,
            y_offset_2d: 0,
            stackable: false,
            cost: 1,
            members: false,
            tradeable: false,
            weight: 0,
            category: None,
            wear_pos: [-1; 3],
            male_models: [-1; 3],
            male_offset: 0,
            female_models: [-1; 3],
            female_offset: 0,
            male_head_models: [-1; 2],
            female_head_models: [-1; 2],
            options: [None, None, Some("Take".to_string()), None, None],
            interface_options: [None, None, None, None, Some("Drop".to_string())],
            sub_options: Default::default(),
            shift_click_drop_index: -2,
            recolors: Vec::new(),
            retextures: Vec::new(),
            noted_id: -1,
            noted_template: -1,
            count_variants: Vec::new(),
            resize: [128; 3],
            ambient: 0,
            contrast: 0,
            team: 0,
            bought_id: -1,
            bought_template: -1,
            placeholder_id: -1,
            placeholder_template: -1,
            params: Params::new(),
        }
    }

    /// Whether this entry is the noted form of another item
    pub fn is_noted(&self) -> bool {
        self.noted_template != -1
    }
}

impl Decode for Item {
    const KIND: &'static str = "item";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut item = Self::new(id);
        loop {
            let opcode = reader.u8()?;
            match opcode {
                0 => break,
                1 => item.inventory_model = reader.u16()?,
                2 => item.name = reader.string()?,
                3 => item.examine = Some(reader.string()?),
                4 => item.zoom_2d = reader.u16()?,
                5 => item.x_angle_2d = reader.u16()?,
                6 => item.y_angle_2d = reader.u16()?,
                7 => item.x_offset_2d = reader.i16()?,
                8 => item.y_offset_2d = reader.i16()?,
                11 => item.stackable = true,
                12 => item.cost = reader.i32()?,
                13 => item.wear_pos[0] = i32::from(reader.u8()?),
                14 => item.wear_pos[1] = i32::from(reader.u8()?),
                16 => item.members = true,
                23 => {
                    item.male_models[0] = i32::from(reader.u16()?);
                    item.male_offset = reader.u8()?;
                }
                24 => item.male_models[1] = i32::from(reader.u16()?),
                25 => {
                    item.female_models[0] = i32::from(reader.u16()?);
                    item.female_offset = reader.u8()?;
                }
                26 => item.female_models[1] = i32::from(reader.u16()?),
                27 => item.wear_pos[2] = i32::from(reader.u8()?),
                30..=34 => item.options[usize::from(opcode - 30)] = read_action(reader)?,
                35..=39 => {
                    item.interface_options[usize::from(opcode - 35)] = read_action(reader)?;
                }
                40 => item.recolors = read_replacements(reader)?,
                41 => item.retextures = read_replacements(reader)?,
                42 => item.shift_click_drop_index = reader.i8()?,
                43 => read_sub_options(reader, &mut item.sub_options)?,
                65 => item.tradeable = true,
                75 => item.weight = reader.i16()?,
                78 => item.male_models[2] = i32::from(reader.u16()?),
                79 => item.female_models[2] = i32::from(reader.u16()?),
                90 => item.male_head_models[0] = i32::from(reader.u16()?),
                91 => item.female_head_models[0] = i32::from(reader.u16()?),
                92 => item.male_head_models[1] = i32::from(reader.u16()?),
                93 => item.female_head_models[1] = i32::from(reader.u16()?),
                94 => item.category = Some(reader.u16()?),
                95 => item.z_angle_2d = reader.u16()?,
                97 => item.noted_id = i32::from(reader.u16()?),
                98 => item.noted_template = i32::from(reader.u16()?),
                100..=109 => {
                    let variant = (reader.u16()?, reader.u16()?);
                    let slot = usize::from(opcode - 100);
                    if item.count_variants.len() <= slot {
                        item.count_variants.resize(slot + 1, (0, 0));
                    }
                    item.count_variants[slot] = variant;
                }
                110 => item.resize[0] = reader.u16()?,
                111 => item.resize[1] = reader.u16()?,
                112 => item.resize[2] = reader.u16()?,
                113 => item.ambient = reader.i8()?,
                114 => item.contrast = reader.i8()?,
                115 => item.team = reader.u8()?,
                139 => item.bought_id = i32::from(reader.u16()?),
                140 => item.bought_template = i32::from(reader.u16()?),
                148 => item.placeholder_id = i32::from(reader.u16()?),
                149 => item.placeholder_template = i32::from(reader.u16()?),
                249 => item.params = read_params(reader)?,
                _ => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(item)
    }
}

/// One option's sub-options, terminated by slot 0; slots are stored one-based
///
/// Entries for an option or slot out of range are consumed and dropped.
fn read_sub_options(
    reader: &mut ByteReader<'_>,
    sub_options: &mut [BTreeMap<u8, String>; 5],
) -> FormatResult<()> {
    let option = usize::from(reader.u8()?);
    loop {
        let slot = reader.u8()?;
        if slot == 0 {
            return Ok(());
        }
        let text = reader.string()?;
        if let Some(entries) = sub_options.get_mut(option)
            && slot <= MAX_SUB_OPTIONS
        {
            entries.insert(slot - 1, text);
        }
    }
}

const MAX_SUB_OPTIONS: u8 = 20;

impl Loadable for Item {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(10),
    };
}
