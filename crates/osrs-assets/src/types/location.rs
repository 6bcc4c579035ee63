//! Location (scenery object) definitions (config archive 6)

use osrs_formats::{ArchiveId, ByteReader, CacheVersion, FormatResult};
use serde::Serialize;

use super::{Replacement, Transforms, read_action, read_replacements, unknown_opcode};
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};
use crate::params::{Params, read_params};

/// First config index revision whose ambient sound opcodes carry a retain byte
pub const SOUND_RETAIN_SINCE: CacheVersion = CacheVersion::osrs(3_200);

/// Model with the placement type it is drawn for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypedModel {
    pub model: u16,
    /// `None` when the model applies to every placement type
    pub kind: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AmbientSound {
    pub sound: i32,
    pub distance: u8,
    pub retain: u8,
    /// Random sounds chosen between `change_ticks` instead of `sound`
    pub random_sounds: Vec<u16>,
    pub change_ticks: (u16, u16),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: u32,
    pub name: String,
    pub models: Vec<TypedModel>,
    pub size_x: u8,
    pub size_y: u8,
    /// 0 none, 1 wall-like, 2 full
    pub interact_type: u8,
    pub blocks_projectile: bool,
    pub wall_or_door: i32,
    pub contoured_ground: i32,
    pub merge_normals: bool,
    pub animation: i32,
    pub decor_displacement: u8,
    pub ambient: i8,
    pub contrast: i8,
    pub actions: [Option<String>; 5],
    pub recolors: Vec<Replacement>,
    pub retextures: Vec<Replacement>,
    pub category: Option<u16>,
    pub rotated: bool,
    pub casts_shadow: bool,
    pub model_size: [u16; 3],
    pub map_scene: i32,
    pub blocking_mask: i8,
    pub offset: [i16; 3],
    pub obstructs_ground: bool,
    pub hollow: bool,
    pub supports_items: i32,
    pub transforms: Option<Transforms>,
    pub ambient_sound: Option<AmbientSound>,
    pub map_area: i32,
    pub randomize_animation_start: bool,
    pub params: Params,
}

impl Location {
    fn new(id: u32) -> Self {
        Self {
            id,
            name: "null".to_string(),
            models: Vec::new(),
            size_x: 1,
            size_y: 1,
            interact_type: 2,
            blocks_projectile: true,
            wall_or_door: -1,
            contoured_ground: -1,
            merge_normals: false,
            animation: -1,
            decor_displacement: 16,
            ambient: 0,
            contrast: 0,
            actions: Default::default(),
            recolors: Vec::new(),
            retextures: Vec::new(),
            category: None,
            rotated: false,
            casts_shadow: true,
            model_size: [128; 3],
            map_scene: -1,
            blocking_mask: 0,
            offset: [0; 3],
            obstructs_ground: false,
            hollow: false,
            supports_items: -1,
            transforms: None,
            ambient_sound: None,
            map_area: -1,
            randomize_animation_start: true,
            params: Params::new(),
        }
    }

    fn sound(&mut self) -> &mut AmbientSound {
        self.ambient_sound.get_or_insert_with(|| AmbientSound {
            sound: -1,
            ..AmbientSound::default()
        })
    }
}

fn read_typed_models(reader: &mut ByteReader<'_>, typed: bool) -> FormatResult<Vec<TypedModel>> {
    let count = reader.u8()?;
    let mut models = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let model = reader.u16()?;
        let kind = if typed { Some(reader.u8()?) } else { None };
        models.push(TypedModel { model, kind });
    }
    Ok(models)
}

impl Decode for Location {
    const KIND: &'static str = "location";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut loc = Self::new(id);
        loop {
            let opcode = reader.u8()?;
            match opcode {
                0 => break,
                1 => loc.models = read_typed_models(reader, true)?,
                2 => loc.name = reader.string()?,
                5 => loc.models = read_typed_models(reader, false)?,
                14 => loc.size_x = reader.u8()?,
                15 => loc.size_y = reader.u8()?,
                17 => {
                    loc.interact_type = 0;
                    loc.blocks_projectile = false;
                }
                18 => loc.blocks_projectile = false,
                19 => loc.wall_or_door = i32::from(reader.u8()?),
                21 => loc.contoured_ground = 0,
                22 => loc.merge_normals = true,
                24 => loc.animation = reader.u16n()?,
                27 => loc.interact_type = 1,
                28 => loc.decor_displacement = reader.u8()?,
                29 => loc.ambient = reader.i8()?,
                30..=34 => loc.actions[usize::from(opcode - 30)] = read_action(reader)?,
                39 => loc.contrast = reader.i8()?,
                40 => loc.recolors = read_replacements(reader)?,
                41 => loc.retextures = read_replacements(reader)?,
                61 => loc.category = Some(reader.u16()?),
                62 => loc.rotated = true,
                64 => loc.casts_shadow = false,
                65 => loc.model_size[0] = reader.u16()?,
                66 => loc.model_size[1] = reader.u16()?,
                67 => loc.model_size[2] = reader.u16()?,
                68 => loc.map_scene = i32::from(reader.u16()?),
                69 => loc.blocking_mask = reader.i8()?,
                70 => loc.offset[0] = reader.i16()?,
                71 => loc.offset[1] = reader.i16()?,
                72 => loc.offset[2] = reader.i16()?,
                73 => loc.obstructs_ground = true,
                74 => loc.hollow = true,
                75 => loc.supports_items = i32::from(reader.u8()?),
                77 => loc.transforms = Some(Transforms::read(reader, false)?),
                78 => {
                    let retain_byte = reader.is_after(SOUND_RETAIN_SINCE);
                    let sound = loc.sound();
                    sound.sound = i32::from(reader.u16()?);
                    sound.distance = reader.u8()?;
                    if retain_byte {
                        sound.retain = reader.u8()?;
                    }
                }
                79 => {
                    let retain_byte = reader.is_after(SOUND_RETAIN_SINCE);
                    let sound = loc.sound();
                    sound.change_ticks = (reader.u16()?, reader.u16()?);
                    sound.distance = reader.u8()?;
                    if retain_byte {
                        sound.retain = reader.u8()?;
                    }
                    let count = reader.u8()?;
                    sound.random_sounds = (0..count)
                        .map(|_| reader.u16())
                        .collect::<FormatResult<_>>()?;
                }
                81 => loc.contoured_ground = i32::from(reader.u8()?) * 256,
                82 => loc.map_area = i32::from(reader.u16()?),
                89 => loc.randomize_animation_start = false,
                92 => loc.transforms = Some(Transforms::read(reader, true)?),
                249 => loc.params = read_params(reader)?,
                _ => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(loc)
    }
}

impl Loadable for Location {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(6),
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use osrs_formats::FormatError;
    use pretty_assertions::assert_eq;

    fn decode_at(data: &[u8], revision: u32) -> FormatResult<Location> {
        let mut reader = ByteReader::new(data).with_version(CacheVersion::osrs(revision));
        Location::decode(&mut reader, 1276)
    }

    #[test]
    fn test_decode_location() {
        let mut data = vec![1, 1, 0x04, 0xD2, 10];
        data.push(2);
        data.extend_from_slice(b"Tree\0");
        data.extend_from_slice(&[14, 2, 15, 2, 24, 0xFF, 0xFF]);
        data.push(30);
        data.extend_from_slice(b"Chop down\0");
        data.extend_from_slice(&[17, 0]);

        let tree = decode_at(&data, 4000).unwrap();
        assert_eq!(tree.id, 1276);
        assert_eq!(tree.name, "Tree");
        assert_eq!(
            tree.models,
            vec![TypedModel {
                model: 1234,
                kind: Some(10)
            }]
        );
        assert_eq!((tree.size_x, tree.size_y), (2, 2));
        assert_eq!(tree.animation, -1);
        assert_eq!(tree.interact_type, 0);
        assert!(!tree.blocks_projectile);
        assert_eq!(tree.actions[0].as_deref(), Some("Chop down"));
    }

    #[test]
    fn test_sound_retain_is_version_gated() {
        let old = decode_at(&[78, 0x00, 0x09, 5, 0], 3_199).unwrap();
        let sound = old.ambient_sound.unwrap();
        assert_eq!((sound.sound, sound.distance, sound.retain), (9, 5, 0));

        let new = decode_at(&[78, 0x00, 0x09, 5, 2, 0], 3_200).unwrap();
        let sound = new.ambient_sound.unwrap();
        assert_eq!((sound.sound, sound.distance, sound.retain), (9, 5, 2));

        // Read with the older layout the retain byte lands where an opcode is expected
        assert!(matches!(
            decode_at(&[78, 0x00, 0x09, 5, 3, 0], 3_199),
            Err(FormatError::UnknownOpcode { opcode: 3, .. })
        ));
    }

    #[test]
    fn test_random_ambient_sounds() {
        let data = [79, 0x00, 0x0A, 0x00, 0x14, 3, 1, 2, 0x00, 0x01, 0x00, 0x02, 0];
        let sound = decode_at(&data, 4000).unwrap().ambient_sound.unwrap();
        assert_eq!(sound.change_ticks, (10, 20));
        assert_eq!(sound.distance, 3);
        assert_eq!(sound.retain, 1);
        assert_eq!(sound.random_sounds, vec![1, 2]);
        assert_eq!(sound.sound, -1);
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        assert!(matches!(
            decode_at(&[3, 0], 4000),
            Err(FormatError::UnknownOpcode {
                kind: "location",
                opcode: 3
            })
        ));
    }
}
