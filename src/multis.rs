//! The multi codec: composite structures (houses, boats) as lists of
//! static tiles at relative offsets, plus the isometric compositor.

use byteorder::{LittleEndian, ReadBytesExt};
use getset::{CopyGetters, Getters};
use std::io::Cursor;
use std::sync::Arc;

use crate::art::Art;
use crate::errors::{IoCtx, Result, UoError};
use crate::file::UoFile;
use crate::utils::bitmap::{Bitmap16, Rect};

pub const MULTI_MAX: u32 = 0x2000;
const RECORD_SIZE: usize = 16;

// Isometric projection of a tile offset.
const TILE_STEP_X: i32 = 22;
const TILE_STEP_Y: i32 = 22;
const Z_STEP: i32 = 4;

/// One component tile of a multi.
#[derive(Clone, Copy, Debug, CopyGetters)]
pub struct MultiItem {
    #[getset(get_copy = "pub")]
    id: u16,
    #[getset(get_copy = "pub")]
    x: i16,
    #[getset(get_copy = "pub")]
    y: i16,
    #[getset(get_copy = "pub")]
    z: i16,
    #[getset(get_copy = "pub")]
    flags: u32,
    #[getset(get_copy = "pub")]
    cliloc: u32,
}

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct Multi {
    #[getset(get_copy = "pub")]
    id: u32,
    items: Vec<MultiItem>,
}

impl Multi {
    pub fn items(&self) -> &[MultiItem] {
        &self.items
    }

    /// Tile-coordinate extents: (min_x, min_y, max_x, max_y).
    pub fn extents(&self) -> (i16, i16, i16, i16) {
        let mut min_x = 0;
        let mut min_y = 0;
        let mut max_x = 0;
        let mut max_y = 0;
        for item in &self.items {
            min_x = min_x.min(item.x);
            min_y = min_y.min(item.y);
            max_x = max_x.max(item.x);
            max_y = max_y.max(item.y);
        }
        (min_x, min_y, max_x, max_y)
    }

    /// Composites the structure out of static art, items drawn in stable
    /// (z, y, x, id) order at `((x-y)*22, (x+y)*22 - z*4)`.
    pub fn image(&self, art: &Art) -> Result<Bitmap16> {
        let mut items = self.items.clone();
        items.sort_by_key(|item| (item.z, item.y, item.x, item.id));

        // First pass: gather art and the canvas bounds.
        let mut placed: Vec<(i32, i32, Bitmap16)> = Vec::with_capacity(items.len());
        let mut bounds: Option<Rect> = None;
        for item in &items {
            let Ok(tile) = art.static_item(item.id as u32) else {
                continue; // missing art never poisons the composite
            };
            let image = tile.image().clone();
            let px = (item.x as i32 - item.y as i32) * TILE_STEP_X;
            let py = (item.x as i32 + item.y as i32) * TILE_STEP_Y - item.z as i32 * Z_STEP;
            let draw_x = px + TILE_STEP_X - image.width() as i32 / 2;
            let draw_y = py + 2 * TILE_STEP_Y - image.height() as i32;
            let rect = Rect::new(
                draw_x,
                draw_y,
                draw_x + image.width() as i32,
                draw_y + image.height() as i32,
            );
            bounds = Some(match bounds {
                None => rect,
                Some(b) => Rect::new(
                    b.x0.min(rect.x0),
                    b.y0.min(rect.y0),
                    b.x1.max(rect.x1),
                    b.y1.max(rect.y1),
                ),
            });
            placed.push((draw_x, draw_y, image));
        }

        let bounds = bounds.unwrap_or(Rect::sized(1, 1));
        let mut canvas = Bitmap16::new(Rect::sized(bounds.width(), bounds.height()));
        for (draw_x, draw_y, image) in &placed {
            for y in 0..image.height() as i32 {
                for x in 0..image.width() as i32 {
                    let pixel = image.at(x, y);
                    if pixel.value() != 0 {
                        canvas.set(draw_x - bounds.x0 + x, draw_y - bounds.y0 + y, pixel);
                    }
                }
            }
        }
        Ok(canvas)
    }
}

/// Decodes a multi entry. Classic payloads are a bare record array; the
/// archive collection prefixes a record count.
pub(crate) fn decode_multi(id: u32, bytes: &[u8], archive: bool, file: &str) -> Result<Multi> {
    let mut rdr = Cursor::new(bytes);
    let count = if archive {
        let declared = rdr.read_u32::<LittleEndian>().ctx(file, "multi record count")? as usize;
        if 4 + declared * RECORD_SIZE == bytes.len() {
            declared
        } else {
            // Header absent after all; treat as a bare record array.
            rdr.set_position(0);
            bytes.len() / RECORD_SIZE
        }
    } else {
        bytes.len() / RECORD_SIZE
    };

    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(MultiItem {
            id: rdr.read_u16::<LittleEndian>().ctx(file, "multi item id")?,
            x: rdr.read_i16::<LittleEndian>().ctx(file, "multi item x")?,
            y: rdr.read_i16::<LittleEndian>().ctx(file, "multi item y")?,
            z: rdr.read_i16::<LittleEndian>().ctx(file, "multi item z")?,
            flags: rdr.read_u32::<LittleEndian>().ctx(file, "multi item flags")?,
            cliloc: rdr.read_u32::<LittleEndian>().ctx(file, "multi item cliloc")?,
        });
    }
    Ok(Multi { id, items })
}

/// Reader over the multi structure file.
pub struct Multis {
    file: Arc<UoFile>,
}

impl Multis {
    pub(crate) fn new(file: Arc<UoFile>) -> Self {
        Self { file }
    }

    pub fn multi(&self, id: u32) -> Result<Multi> {
        if id >= MULTI_MAX {
            return Err(UoError::out_of_range(
                "multi id",
                id as i64,
                0,
                MULTI_MAX as i64,
            ));
        }
        let archive = self.file.is_archive();
        self.file
            .decode(id, |bytes, _extra| decode_multi(id, bytes, archive, self.file.name()))
    }

    pub fn iter(&self) -> impl Iterator<Item = Multi> + '_ {
        self.file.ids().filter_map(|id| self.multi(id).ok())
    }
}
