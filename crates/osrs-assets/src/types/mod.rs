//! Definition decoders
//!
//! Every config decoder reads a one-byte opcode in a loop until opcode 0.
//! Each opcode consumes a fixed field sequence; an opcode a type does not
//! define is an error, since its length is unknown and skipping it would
//! misalign every later field.

pub mod enums;
pub mod health_bar;
pub mod identity_kit;
pub mod inventory;
pub mod item;
pub mod location;
pub mod npc;
pub mod overlay;
pub mod param;
pub mod sprite;
pub mod structs;
pub mod underlay;
pub mod varbit;

pub use enums::EnumDefinition;
pub use health_bar::HealthBar;
pub use identity_kit::IdentityKit;
pub use inventory::Inventory;
pub use item::Item;
pub use location::Location;
pub use npc::Npc;
pub use overlay::Overlay;
pub use param::ParamDefinition;
pub use sprite::{SpriteFrame, SpriteSheet};
pub use structs::StructDefinition;
pub use underlay::Underlay;
pub use varbit::Varbit;

use osrs_formats::{ByteReader, FormatError, FormatResult};
use serde::Serialize;

pub(crate) fn unknown_opcode(kind: &'static str, opcode: u8) -> FormatError {
    FormatError::UnknownOpcode { kind, opcode }
}

/// Colour or texture substitution applied to a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub find: u16,
    pub replace: u16,
}

/// Count-prefixed list of `(find, replace)` pairs
pub(crate) fn read_replacements(reader: &mut ByteReader<'_>) -> FormatResult<Vec<Replacement>> {
    let count = reader.u8()?;
    (0..count)
        .map(|_| {
            Ok::<_, FormatError>(Replacement {
                find: reader.u16()?,
                replace: reader.u16()?,
            })
        })
        .collect()
}

/// Menu option text; "Hidden" marks a slot the client never shows
pub(crate) fn read_action(reader: &mut ByteReader<'_>) -> FormatResult<Option<String>> {
    let action = reader.string()?;
    Ok((!action.eq_ignore_ascii_case("hidden")).then_some(action))
}

/// Count-prefixed list of u16 model IDs
pub(crate) fn read_models(reader: &mut ByteReader<'_>) -> FormatResult<Vec<u16>> {
    let count = reader.u8()?;
    (0..count).map(|_| reader.u16()).collect()
}

/// Varbit/varp switch selecting between alternative definitions
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Transforms {
    /// Varbit driving the switch, -1 when a varp is used instead
    pub varbit: i32,
    /// Varp driving the switch, -1 when a varbit is used instead
    pub varp: i32,
    /// Definition IDs indexed by the variable's value, -1 for none
    pub ids: Vec<i32>,
}

impl Transforms {
    /// Read a transform block
    ///
    /// With `with_default` set the block carries an extra fallback ID, used
    /// for values past the end of the table, which is appended last.
    pub(crate) fn read(reader: &mut ByteReader<'_>, with_default: bool) -> FormatResult<Self> {
        let varbit = reader.u16n()?;
        let varp = reader.u16n()?;
        let fallback = if with_default { Some(reader.u16n()?) } else { None };
        let count = usize::from(reader.u8()?);
        let mut ids = Vec::with_capacity(count + 2);
        for _ in 0..=count {
            ids.push(reader.u16n()?);
        }
        ids.extend(fallback);
        Ok(Self { varbit, varp, ids })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hidden_action_is_dropped() {
        let mut reader = ByteReader::new(b"Hidden\0Wield\0");
        assert_eq!(read_action(&mut reader).unwrap(), None);
        assert_eq!(read_action(&mut reader).unwrap().as_deref(), Some("Wield"));
    }

    #[test]
    fn test_transforms_with_fallback() {
        let data = [0xFF, 0xFF, 0x01, 0x02, 0x00, 0x07, 0x01, 0x00, 0x05, 0xFF, 0xFF];
        let transforms = Transforms::read(&mut ByteReader::new(&data), true).unwrap();
        assert_eq!(
            transforms,
            Transforms {
                varbit: -1,
                varp: 0x0102,
                ids: vec![5, -1, 7],
            }
        );
    }
}
