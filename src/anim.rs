//! The animation codec: body/action/direction frame tables with a shared
//! 256-color palette and XOR-masked run headers.

use byteorder::{LittleEndian, ReadBytesExt};
use getset::{CopyGetters, Getters};
use std::io::Cursor;
use std::sync::Arc;

use crate::animdata::{Animdata, AnimdataEntry};
use crate::errors::{IoCtx, Result, UoError};
use crate::file::UoFile;
use crate::utils::bitmap::{Bitmap16, Rect};
use crate::utils::color::Argb1555;

pub const DIRECTION_QTY: u32 = 8;
const PALETTE_QTY: usize = 256;
const RUN_TERMINATOR: u32 = 0x7FFF_7FFF;
const DOUBLE_XOR: u32 = (0x200 << 22) | (0x200 << 12);
const DIMENSION_MAX: u16 = 2048;

/// Maps (body, action, direction) to the frame-table entry index. The five
/// stored directions cover eight facings; directions past 4 reuse the
/// mirrored entry and flip horizontally.
pub(crate) fn frame_entry_index(body: u32, action: u32, direction: u32) -> (u32, bool) {
    let base = match body {
        0..200 => body * 110,
        200..400 => 22_000 + (body - 200) * 65,
        _ => 35_000 + (body - 400) * 175,
    };
    let flip = direction > 4;
    let stored_direction = if flip { 8 - direction } else { direction };
    (base + action * 5 + stored_direction, flip)
}

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct AnimFrame {
    #[getset(get_copy = "pub")]
    center_x: i16,
    #[getset(get_copy = "pub")]
    center_y: i16,
    #[getset(get = "pub")]
    image: Bitmap16,
}

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct Animation {
    #[getset(get_copy = "pub")]
    body: u32,
    #[getset(get_copy = "pub")]
    action: u32,
    #[getset(get_copy = "pub")]
    direction: u32,
    #[getset(get = "pub")]
    frames: Vec<AnimFrame>,
    /// Sequencing metadata, when the metadata table has a record.
    data: Option<AnimdataEntry>,
}

impl Animation {
    pub fn data(&self) -> Option<&AnimdataEntry> {
        self.data.as_ref()
    }
}

/// Decodes one frame-table entry: 512-byte palette (stored with the alpha
/// convention inverted), signed frame count, then per-frame offsets
/// relative to the palette start. Zero or negative offsets mark absent
/// frames.
pub(crate) fn decode_frames(bytes: &[u8], flip: bool, file: &str) -> Result<Vec<AnimFrame>> {
    let mut rdr = Cursor::new(bytes);
    let mut palette = [Argb1555::TRANSPARENT; PALETTE_QTY];
    for slot in palette.iter_mut() {
        let stored = rdr.read_u16::<LittleEndian>().ctx(file, "anim palette")?;
        *slot = Argb1555::from_value(stored).alpha_flipped();
    }

    let frame_count = rdr.read_i32::<LittleEndian>().ctx(file, "anim frame count")?;
    if frame_count <= 0 {
        return Ok(Vec::new());
    }
    // The offset table must fit inside the payload.
    if frame_count as u64 * 4 > bytes.len() as u64 {
        return Err(UoError::invalid(
            file,
            format!("frame count {frame_count} exceeds the entry"),
        ));
    }
    let mut offsets = Vec::with_capacity(frame_count as usize);
    for _ in 0..frame_count {
        offsets.push(rdr.read_i32::<LittleEndian>().ctx(file, "anim frame offset")?);
    }

    let mut frames = Vec::with_capacity(offsets.len());
    for offset in offsets {
        if offset <= 0 {
            continue; // absent frame
        }
        rdr.set_position(offset as u64);
        let center_x = rdr.read_i16::<LittleEndian>().ctx(file, "frame center x")?;
        let center_y = rdr.read_i16::<LittleEndian>().ctx(file, "frame center y")?;
        let width = rdr.read_u16::<LittleEndian>().ctx(file, "frame width")?;
        let height = rdr.read_u16::<LittleEndian>().ctx(file, "frame height")?;
        if width == 0 || width > DIMENSION_MAX || height == 0 || height > DIMENSION_MAX {
            return Err(UoError::invalid(
                file,
                format!("implausible anim frame dimensions {width}x{height}"),
            ));
        }

        let x_base = center_x as i32 - 0x200;
        let y_base = center_y as i32 + height as i32 - 0x200;
        let mut image = Bitmap16::new(Rect::sized(width as u32, height as u32));

        loop {
            let header = rdr.read_u32::<LittleEndian>().ctx(file, "frame run header")?;
            if header == RUN_TERMINATOR {
                break;
            }
            let header = header ^ DOUBLE_XOR;
            let run_length = (header & 0xFFF) as i32;
            let run_x = ((header >> 22) & 0x3FF) as i32;
            let run_y = ((header >> 12) & 0x3FF) as i32;
            let y = run_y + y_base;
            let x_start = run_x + x_base;
            for i in 0..run_length {
                let index = rdr.read_u8().ctx(file, "frame run pixel")?;
                let x = if flip {
                    width as i32 - 1 - (x_start + i)
                } else {
                    x_start + i
                };
                image.set(x, y, palette[index as usize]);
            }
        }

        frames.push(AnimFrame {
            center_x: if flip {
                width as i16 - center_x
            } else {
                center_x
            },
            center_y,
            image,
        });
    }
    Ok(frames)
}

/// Animation reader over the frame-table file plus the optional metadata
/// table.
pub struct Animations {
    file: Arc<UoFile>,
    animdata: Option<Arc<Animdata>>,
}

impl Animations {
    pub(crate) fn new(file: Arc<UoFile>, animdata: Option<Arc<Animdata>>) -> Self {
        Self { file, animdata }
    }

    /// Which animation file family serves a body. Family selection across
    /// anim2/anim3/... is out of scope; everything resolves to the first
    /// file. Kept as the single point to extend.
    pub fn anim_file_index(&self, _body: u32) -> u32 {
        1
    }

    pub fn animation(&self, body: u32, action: u32, direction: u32) -> Result<Animation> {
        if direction >= DIRECTION_QTY {
            return Err(UoError::out_of_range(
                "animation direction",
                direction as i64,
                0,
                DIRECTION_QTY as i64,
            ));
        }
        let (index, flip) = frame_entry_index(body, action, direction);
        let frames = self
            .file
            .decode(index, |bytes, _extra| decode_frames(bytes, flip, self.file.name()))?;
        Ok(Animation {
            body,
            action,
            direction,
            frames,
            data: self
                .animdata
                .as_deref()
                .and_then(|table| table.entry(body).cloned()),
        })
    }
}
