//! Sprite sheets (index 8, one sheet per archive)
//!
//! Unlike the config types a sheet is laid out back to front. The last two
//! bytes hold the frame count. Before them sit the sheet size, the palette
//! length and the per-frame offsets and sizes. The palette precedes that
//! block. Pixel data starts at offset 0, one frame after another, each frame
//! prefixed with a flags byte:
//!
//! - bit 0: indices are stored column by column instead of row by row
//! - bit 1: an alpha plane in the same order follows the indices

use osrs_formats::{ByteReader, FormatError, FormatResult};
use serde::Serialize;

use crate::loadable::{Decode, Layout, Loadable, SPRITE_INDEX};

const FLAG_VERTICAL: u8 = 0b01;
const FLAG_ALPHA: u8 = 0b10;

/// One frame of a sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteFrame {
    pub offset_x: u16,
    pub offset_y: u16,
    pub width: u16,
    pub height: u16,
    /// Row-major ARGB pixels; fully transparent where the palette index is 0
    #[serde(skip)]
    pub pixels: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteSheet {
    pub id: u32,
    pub width: u16,
    pub height: u16,
    pub frames: Vec<SpriteFrame>,
}

/// Read a `width` by `height` plane, returned row-major
fn read_plane(
    reader: &mut ByteReader<'_>,
    width: usize,
    height: usize,
    vertical: bool,
) -> FormatResult<Vec<u8>> {
    let raw = reader.bytes(width * height)?;
    if !vertical {
        return Ok(raw.to_vec());
    }
    let mut plane = vec![0; raw.len()];
    for x in 0..width {
        for y in 0..height {
            plane[y * width + x] = raw[x * height + y];
        }
    }
    Ok(plane)
}

impl Decode for SpriteSheet {
    const KIND: &'static str = "sprite";

    fn decode(reader: &mut ByteReader<'_>, id: u32) -> FormatResult<Self> {
        let len = reader.len();
        let eof = |wanted| FormatError::UnexpectedEof {
            offset: 0,
            wanted,
            len,
        };

        let count_at = len.checked_sub(2).ok_or_else(|| eof(2))?;
        reader.set_offset(count_at)?;
        let count = usize::from(reader.u16()?);

        let header_at = len
            .checked_sub(7 + count * 8)
            .ok_or_else(|| eof(7 + count * 8))?;
        reader.set_offset(header_at)?;
        let width = reader.u16()?;
        let height = reader.u16()?;
        let palette_len = usize::from(reader.u8()?) + 1;

        let mut frames: Vec<SpriteFrame> = (0..count)
            .map(|_| SpriteFrame {
                offset_x: 0,
                offset_y: 0,
                width: 0,
                height: 0,
                pixels: Vec::new(),
            })
            .collect();
        for frame in &mut frames {
            frame.offset_x = reader.u16()?;
        }
        for frame in &mut frames {
            frame.offset_y = reader.u16()?;
        }
        for frame in &mut frames {
            frame.width = reader.u16()?;
        }
        for frame in &mut frames {
            frame.height = reader.u16()?;
        }

        let palette_at = header_at
            .checked_sub((palette_len - 1) * 3)
            .ok_or_else(|| eof((palette_len - 1) * 3))?;
        reader.set_offset(palette_at)?;
        let mut palette = vec![0u32; palette_len];
        for colour in palette.iter_mut().skip(1) {
            // Black is stored as 1 so it stays distinct from transparency
            *colour = reader.u24()?.max(1);
        }

        reader.set_offset(0)?;
        for frame in &mut frames {
            let (w, h) = (usize::from(frame.width), usize::from(frame.height));
            let flags = reader.u8()?;
            let vertical = flags & FLAG_VERTICAL != 0;
            let indices = read_plane(reader, w, h, vertical)?;
            let alphas = if flags & FLAG_ALPHA != 0 {
                read_plane(reader, w, h, vertical)?
            } else {
                indices
                    .iter()
                    .map(|&index| if index == 0 { 0 } else { 0xFF })
                    .collect()
            };

            frame.pixels = indices
                .iter()
                .zip(&alphas)
                .map(|(&index, &alpha)| {
                    let rgb = palette.get(usize::from(index)).copied().ok_or_else(|| {
                        FormatError::InvalidArchive(format!(
                            "sprite {id}: palette index {index} out of {palette_len} colours"
                        ))
                    })?;
                    Ok((u32::from(alpha) << 24) | rgb)
                })
                .collect::<FormatResult<_>>()?;
        }

        Ok(Self {
            id,
            width,
            height,
            frames,
        })
    }
}

impl Loadable for SpriteSheet {
    const LAYOUT: Layout = Layout::PerArchive {
        index: SPRITE_INDEX,
    };
}
