//! Struct definitions (config archive 34): a bare params map

use osrs_formats::{ArchiveId, ByteReader, FormatResult};
use serde::Serialize;

use super::unknown_opcode;
use crate::loadable::{CONFIG_INDEX, Decode, Layout, Loadable};
use crate::params::{Params, read_params};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructDefinition {
    pub id: u32,
    pub params: Params,
}

impl Decode for StructDefinition {
    const KIND: &'static str = "struct";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let mut def = Self {
            id,
            params: Params::new(),
        };
        loop {
            match reader.u8()? {
                0 => break,
                249 => def.params = read_params(reader)?,
                opcode => return Err(unknown_opcode(Self::KIND, opcode)),
            }
        }
        Ok(def)
    }
}

impl Loadable for StructDefinition {
    const LAYOUT: Layout = Layout::PerFile {
        index: CONFIG_INDEX,
        archive: ArchiveId(34),
    };
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn test_decode_struct() {
        let mut data = vec![249, 1, 1, 0x00, 0x02, 0x01];
        data.extend_from_slice(b"Quest\0");
        data.push(0);
        let def = StructDefinition::decode(&mut ByteReader::new(&data), 9).unwrap();
        assert_eq!(def.params.get(&0x0201), Some(&ParamValue::Str("Quest".to_string())));
    }

    #[test]
    fn test_unknown_opcode_rejected() {
        assert!(StructDefinition::decode(&mut ByteReader::new(&[1, 0]), 1).is_err());
    }
}
