//! Enum definitions (config archive 8)
//!
//! Lookup tables from an int key to an int or string value, with a default
//! for missing keys.

use osrs_formats::{ArchiveId, ByteReader, FormatResult};
use serde::Serialize;
use std::collections::BTreeMap;

use super::unknown_opcode;
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};
use crate::params::ParamValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDefinition {
    pub id: u32,
    /// Script type character of the keys
    pub key_type: char,
    /// Script type character of the values
    pub value_type: char,
    pub default_string: String,
    pub default_int: i32,
    pub values: BTreeMap<i32, ParamValue>,
}

impl EnumDefinition {
    fn new(id: u32) -> Self {
        Self {
            id,
            key_type: '\0',
            value_type: '\0',
            default_string: "null".to_string(),
            default_int: 0,
            values: BTreeMap::new(),
        }
    }

    /// Integer value of `key`, falling back to the default
    pub fn int(&self, key: i32) -> i32 {
        self.values
            .get(&key)
            .and_then(ParamValue::as_int)
            .unwrap_or(self.default_int)
    }

    /// String value of `key`, falling back to the default
    pub fn string(&self, key: i32) -> &str {
        self.values
            .get(&key)
            .and_then(ParamValue::as_str)
            .unwrap_or(&self.default_string)
    }
}

impl Decode for EnumDefinition {
    const KIND: &'static str = "enum";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut def = Self::new(id);
        loop {
            let opcode = reader.u8()?;
            match opcode {
                0 => break,
                1 => def.key_type = char::from(reader.u8()?),
                2 => def.value_type = char::from(reader.u8()?),
                3 => def.default_string = reader.string()?,
                4 => def.default_int = reader.i32()?,
                5 | 6 => {
                    let count = reader.u16()?;
                    for _ in 0..count {
                        let key = reader.i32()?;
                        let value = if opcode == 5 {
                            ParamValue::Str(reader.string()?)
                        } else {
                            ParamValue::Int(reader.i32()?)
                        };
                        def.values.insert(key, value);
                    }
                }
                _ => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(def)
    }
}

impl Loadable for EnumDefinition {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(8),
    };
}
