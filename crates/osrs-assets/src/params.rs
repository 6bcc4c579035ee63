//! Typed key/value maps shared by several definitions
//!
//! Items, NPCs, locations and structs carry a params block under opcode 249:
//! a count, then per entry a string flag, a 24-bit param ID and either a
//! string or a signed 32-bit value. Enums store their values the same way.

use osrs_formats::{ByteReader, FormatResult};
use serde::Serialize;
use std::collections::BTreeMap;

/// A param or enum value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i32),
    Str(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::Str(s) => Some(s),
        }
    }
}

/// Params keyed by param ID
pub type Params = BTreeMap<u32, ParamValue>;

/// Read one opcode 249 params block
pub fn read_params(reader: &mut ByteReader<'_>) -> FormatResult<Params> {
    let count = reader.u8()?;
    let mut params = Params::new();
    for _ in 0..count {
        let is_string = reader.u8()? == 1;
        let key = reader.u24()?;
        let value = if is_string {
            ParamValue::Str(reader.string()?)
        } else {
            ParamValue::Int(reader.i32()?)
        };
        params.insert(key, value);
    }
    Ok(params)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use osrs_formats::FormatError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_mixed_params() {
        let mut data = vec![2];
        data.extend_from_slice(&[0, 0x00, 0x01, 0x2C]);
        data.extend_from_slice(&(-5i32).to_be_bytes());
        data.extend_from_slice(&[1, 0x01, 0x00, 0x00]);
        data.extend_from_slice(b"Bank\0");

        let params = read_params(&mut ByteReader::new(&data)).unwrap();
        assert_eq!(params.get(&300), Some(&ParamValue::Int(-5)));
        assert_eq!(params[&0x010000].as_str(), Some("Bank"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_truncated_params_fail() {
        let data = [1, 0, 0x00, 0x01];
        assert!(matches!(
            read_params(&mut ByteReader::new(&data)),
            Err(FormatError::UnexpectedEof { .. })
        ));
    }
}
