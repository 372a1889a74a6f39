//! The art codec: 44x44 diamond land tiles and RLE static tiles.

use byteorder::{LittleEndian, ReadBytesExt};
use getset::{CopyGetters, Getters};
use std::io::Cursor;
use std::sync::Arc;

use crate::errors::{IoCtx, Result, UoError};
use crate::file::UoFile;
use crate::tiledata::{LAND_TILE_MAX, STATIC_TILE_MAX, TileData, TileFlags};
use crate::utils::bitmap::{Bitmap16, Rect};
use crate::utils::color::Argb1555;

/// Static art entries sit past the land section in the art file.
pub(crate) const STATIC_FILE_BASE: u32 = LAND_TILE_MAX;

pub const LAND_SIZE: u32 = 44;
const DIMENSION_MAX: u16 = 2048;

/// A decoded art tile with its tiledata annotations.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct ArtTile {
    #[getset(get_copy = "pub")]
    id: u32,
    #[getset(get = "pub")]
    image: Bitmap16,
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    flags: TileFlags,
}

/// Decodes the 44x44 land diamond: row y holds `2*(y+1)` pixels for the
/// upper half and `44 - 2*(y-22)` for the lower, centered horizontally.
/// The alpha bit is forced on.
pub(crate) fn decode_land(bytes: &[u8], file: &str) -> Result<Bitmap16> {
    if bytes.len() < 2048 {
        return Err(UoError::truncated(
            file,
            format!("land art needs 2048 bytes, got {}", bytes.len()),
        ));
    }
    let mut rdr = Cursor::new(bytes);
    let mut image = Bitmap16::new(Rect::sized(LAND_SIZE, LAND_SIZE));
    for y in 0..LAND_SIZE as i32 {
        let (start, count) = if y < 22 {
            (22 - y - 1, 2 * (y + 1))
        } else {
            (y - 22, 44 - 2 * (y - 22))
        };
        for x in start..start + count {
            let color = rdr.read_u16::<LittleEndian>().ctx(file, "land pixel")?;
            image.set(x, y, Argb1555::from_value(color).opaque());
        }
    }
    Ok(image)
}

/// Decodes the static RLE format: 4-byte header, dimensions, a per-row
/// lookup table in words, then `(x_skip, run_length)` runs per row. Stored
/// colors carry the alpha bit inverted and are XOR-ed back on decode.
pub(crate) fn decode_static(bytes: &[u8], file: &str) -> Result<Bitmap16> {
    let mut rdr = Cursor::new(bytes);
    let _header = rdr.read_u32::<LittleEndian>().ctx(file, "static art header")?;
    let width = rdr.read_u16::<LittleEndian>().ctx(file, "static art width")?;
    let height = rdr.read_u16::<LittleEndian>().ctx(file, "static art height")?;
    if width == 0 || width > DIMENSION_MAX || height == 0 || height > DIMENSION_MAX {
        return Err(UoError::invalid(
            file,
            format!("implausible static art dimensions {width}x{height}"),
        ));
    }

    let mut lookup = vec![0u16; height as usize];
    for slot in lookup.iter_mut() {
        *slot = rdr.read_u16::<LittleEndian>().ctx(file, "static art lookup")?;
    }
    let lookup_base = 8 + height as u64 * 2;

    let mut image = Bitmap16::new(Rect::sized(width as u32, height as u32));
    for y in 0..height as i32 {
        rdr.set_position(lookup_base + lookup[y as usize] as u64 * 2);
        let mut x: i32 = 0;
        loop {
            let x_skip = rdr.read_u16::<LittleEndian>().ctx(file, "static art run")?;
            let run_length = rdr.read_u16::<LittleEndian>().ctx(file, "static art run")?;
            if x_skip == 0 && run_length == 0 {
                break;
            }
            x += x_skip as i32;
            for _ in 0..run_length {
                let color = rdr.read_u16::<LittleEndian>().ctx(file, "static art pixel")?;
                image.set(x, y, Argb1555::from_value(color).alpha_flipped());
                x += 1;
            }
        }
    }
    Ok(image)
}

/// Art reader joining pixel data with tiledata names and flags.
pub struct Art {
    file: Arc<UoFile>,
    tiledata: Arc<TileData>,
}

impl Art {
    pub(crate) fn new(file: Arc<UoFile>, tiledata: Arc<TileData>) -> Self {
        Self { file, tiledata }
    }

    pub fn land(&self, id: u32) -> Result<ArtTile> {
        if id >= LAND_TILE_MAX {
            return Err(UoError::out_of_range(
                "land art id",
                id as i64,
                0,
                LAND_TILE_MAX as i64,
            ));
        }
        let image = self
            .file
            .decode(id, |bytes, _extra| decode_land(bytes, self.file.name()))?;
        let info = self.tiledata.land_info(id)?;
        Ok(ArtTile {
            id,
            image,
            name: info.name().clone(),
            flags: info.flags(),
        })
    }

    pub fn static_item(&self, id: u32) -> Result<ArtTile> {
        if id >= STATIC_TILE_MAX {
            return Err(UoError::out_of_range(
                "static art id",
                id as i64,
                0,
                STATIC_TILE_MAX as i64,
            ));
        }
        let image = self.file.decode(STATIC_FILE_BASE + id, |bytes, _extra| {
            decode_static(bytes, self.file.name())
        })?;
        let info = self.tiledata.static_info(id)?;
        Ok(ArtTile {
            id,
            image,
            name: info.name().clone(),
            flags: info.flags(),
        })
    }

    pub fn land_iter(&self) -> impl Iterator<Item = ArtTile> + '_ {
        self.file
            .ids()
            .take_while(|&id| id < LAND_TILE_MAX)
            .filter_map(|id| self.land(id).ok())
    }

    pub fn static_iter(&self) -> impl Iterator<Item = ArtTile> + '_ {
        self.file
            .ids()
            .skip_while(|&id| id < STATIC_FILE_BASE)
            .filter_map(|id| self.static_item(id - STATIC_FILE_BASE).ok())
    }
}
