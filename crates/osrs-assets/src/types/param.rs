//! Param definitions (config archive 11)

use osrs_formats::{ArchiveId, ByteReader, FormatResult};
use serde::Serialize;

use super::unknown_opcode;
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};

/// Type and default value of one param key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamDefinition {
    pub id: u32,
    pub value_type: char,
    pub default_int: i32,
    pub default_string: Option<String>,
    /// Whether members-only content drops the param on free worlds
    pub members_only: bool,
}

impl Decode for ParamDefinition {
    const KIND: &'static str = "param";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut def = Self {
            id,
            value_type: '\0',
            default_int: 0,
            default_string: None,
            members_only: true,
        };
        loop {
            match reader.u8()? {
                0 => break,
                1 => def.value_type = char::from(reader.u8()?),
                2 => def.default_int = reader.i32()?,
                4 => def.members_only = false,
                5 => def.default_string = Some(reader.string()?),
                opcode => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(def)
    }
}

impl Loadable for ParamDefinition {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(11),
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_param() {
        let mut data = vec![1, b'i', 2];
        data.extend_from_slice(&25i32.to_be_bytes());
        data.extend_from_slice(&[4, 0]);
        let def = ParamDefinition::decode(&mut ByteReader::new(&data), 3).unwrap();
        assert_eq!(
            def,
            ParamDefinition {
                id: 3,
                value_type: 'i',
                default_int: 25,
                default_string: None,
                members_only: false,
            }
        );
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        assert!(ParamDefinition::decode(&mut ByteReader::new(&[3, 0]), 1).is_err());
    }
}
