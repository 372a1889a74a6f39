//! The gump codec: per-scanline RLE UI graphics.

use byteorder::{LittleEndian, ReadBytesExt};
use getset::{CopyGetters, Getters};
use std::io::Cursor;
use std::sync::Arc;

use crate::errors::{IoCtx, Result, UoError};
use crate::file::UoFile;
use crate::utils::bitmap::{Bitmap16, Rect};
use crate::utils::color::Argb1555;

pub const GUMP_MAX: u32 = 0x10000;
const DIMENSION_MAX: u64 = 2048;

/// A decoded gump image.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct Gump {
    #[getset(get_copy = "pub")]
    id: u32,
    #[getset(get = "pub")]
    image: Bitmap16,
}

fn plausible(width: u64, height: u64) -> bool {
    width > 0 && width <= DIMENSION_MAX && height > 0 && height <= DIMENSION_MAX
}

/// Pulls the dimensions out of the extra word. Classic indices pack
/// `w | h<<16` into the low dword; the archive variant widens to
/// `w | h<<32`.
fn dims_from_extra(extra: u64) -> Option<(u32, u32)> {
    let (aw, ah) = (extra & 0xFFFF_FFFF, extra >> 32);
    if ah != 0 && plausible(aw, ah) {
        return Some((aw as u32, ah as u32));
    }
    let (cw, ch) = (extra & 0xFFFF, (extra >> 16) & 0xFFFF);
    if plausible(cw, ch) {
        return Some((cw as u32, ch as u32));
    }
    None
}

/// Decodes a gump payload. When the extra word carries no plausible
/// dimensions they are read from an 8-byte inline header instead.
pub(crate) fn decode_gump(bytes: &[u8], extra: u64, file: &str) -> Result<Bitmap16> {
    let (width, height, data) = match dims_from_extra(extra) {
        Some((w, h)) => (w, h, bytes),
        None => {
            let mut rdr = Cursor::new(bytes);
            let w = rdr.read_u32::<LittleEndian>().ctx(file, "gump width")? as u64;
            let h = rdr.read_u32::<LittleEndian>().ctx(file, "gump height")? as u64;
            if !plausible(w, h) {
                return Err(UoError::invalid(
                    file,
                    format!("implausible gump dimensions {w}x{h}"),
                ));
            }
            (w as u32, h as u32, &bytes[8..])
        }
    };

    let mut rdr = Cursor::new(data);
    let mut lookup = vec![0u32; height as usize];
    for slot in lookup.iter_mut() {
        *slot = rdr.read_u32::<LittleEndian>().ctx(file, "gump scanline table")?;
    }
    let table_end = height as u64 * 4;

    let mut image = Bitmap16::new(Rect::sized(width, height));
    for y in 0..height as i32 {
        rdr.set_position(table_end + lookup[y as usize] as u64 * 4);
        let mut x: i32 = 0;
        while x < width as i32 {
            let color = rdr.read_u16::<LittleEndian>().ctx(file, "gump run color")?;
            let count = rdr.read_u16::<LittleEndian>().ctx(file, "gump run count")?;
            if count == 0 {
                // A zero-length run cannot advance the scanline.
                return Err(UoError::invalid(file, format!("empty gump run at row {y}")));
            }
            // The stored color already bears its intended alpha bit.
            for _ in 0..count {
                image.set(x, y, Argb1555::from_value(color));
                x += 1;
            }
        }
    }
    Ok(image)
}

/// Gump reader over the resolved art file.
pub struct Gumps {
    file: Arc<UoFile>,
}

impl Gumps {
    pub(crate) fn new(file: Arc<UoFile>) -> Self {
        Self { file }
    }

    pub fn gump(&self, id: u32) -> Result<Gump> {
        if id >= GUMP_MAX {
            return Err(UoError::out_of_range(
                "gump id",
                id as i64,
                0,
                GUMP_MAX as i64,
            ));
        }
        let image = self
            .file
            .decode(id, |bytes, extra| decode_gump(bytes, extra, self.file.name()))?;
        Ok(Gump { id, image })
    }

    pub fn iter(&self) -> impl Iterator<Item = Gump> + '_ {
        self.file.ids().filter_map(|id| self.gump(id).ok())
    }
}
