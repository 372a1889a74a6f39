//! The map codec: 8x8 land blocks co-read with the statics blob and
//! annotated through tiledata.

use getset::{CopyGetters, Getters};
use smallvec::SmallVec;
use std::sync::Arc;

use crate::errors::{Result, UoError};
use crate::file::UoFile;
use crate::radarcol::RadarColors;
use crate::tiledata::{TileData, TileFlags};
use crate::utils::bitmap::{Bitmap16, Rect};
use crate::utils::color::Argb1555;

// Cells are stored in blocks left-to-right then top-to-bottom; blocks are
// stored top-to-bottom then left-to-right (column-major).
pub const CELLS_PER_ROW: u32 = 8;
pub const CELLS_PER_COLUMN: u32 = 8;
pub const CELLS_PER_BLOCK: u32 = CELLS_PER_ROW * CELLS_PER_COLUMN;
pub const BLOCK_PACKED_SIZE: u32 = 4 + CELLS_PER_BLOCK * 3; // 196

/// UOP map archives pack this many blocks into each entry.
const ARCHIVE_BLOCKS_PER_ENTRY: u32 = 4096;
const STATIC_RECORD_SIZE: usize = 7;

/// Pre-Mondain's-Legacy map0/map1 files are smaller than this.
const ML_MAP_FILE_SIZE: u64 = 77_070_336;

// Size of a map plane, expressed in cells/tiles.
#[derive(Clone, Copy, Debug)]
pub struct MapSizeCells {
    pub width: u32,
    pub height: u32,
}

// Size of a map plane, expressed in blocks.
#[derive(Clone, Copy, Debug)]
pub struct MapSizeBlocks {
    pub width: u32,
    pub height: u32,
}

// A rectangle in the map; always in tiles/cells.
#[derive(Clone, Copy, Debug)]
pub struct MapRectCells {
    pub x0: u32,
    pub y0: u32,
    pub width: u32,
    pub height: u32,
}

/// The column-major block layout: block columns are stored whole, top to
/// bottom, before the next column starts.
#[inline(always)]
pub(crate) fn block_index(block_x: u32, block_y: u32, blocks_down: u32) -> u32 {
    block_x * blocks_down + block_y
}

/// Where a block lives: (entry id, byte offset of its first cell). The
/// archive variant packs 4096 blocks per entry; the classic file is opened
/// with one 196-byte entry per block.
#[inline(always)]
pub(crate) fn block_entry_location(archive: bool, block_index: u32) -> (u32, u64) {
    if archive {
        let entry = block_index / ARCHIVE_BLOCKS_PER_ENTRY;
        let offset = (block_index % ARCHIVE_BLOCKS_PER_ENTRY) as u64 * BLOCK_PACKED_SIZE as u64 + 4;
        (entry, offset)
    } else {
        (block_index, 4)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct MapCell {
    pub id: u16,
    pub z: i8,
}

/// A placed object on a tile.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct MapStatic {
    #[getset(get_copy = "pub")]
    id: u16,
    /// Position inside the block, 0..8.
    #[getset(get_copy = "pub")]
    x: u8,
    #[getset(get_copy = "pub")]
    y: u8,
    #[getset(get_copy = "pub")]
    z: i8,
    #[getset(get_copy = "pub")]
    hue: u16,
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    flags: TileFlags,
    #[getset(get_copy = "pub")]
    height: i8,
}

/// One tile of the map: the land cell plus its statics, sorted by
/// (z, y, x, id).
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct MapTile {
    #[getset(get_copy = "pub")]
    x: u32,
    #[getset(get_copy = "pub")]
    y: u32,
    #[getset(get_copy = "pub")]
    land_id: u16,
    #[getset(get_copy = "pub")]
    z: i8,
    #[getset(get = "pub")]
    land_name: String,
    statics: SmallVec<[MapStatic; 4]>,
}

impl MapTile {
    pub fn statics(&self) -> &[MapStatic] {
        &self.statics
    }
}

/// One map plane with its statics and annotation sources.
#[derive(CopyGetters)]
pub struct TileMap {
    #[getset(get_copy = "pub")]
    index: u32,
    size: MapSizeCells,
    blocks: MapSizeBlocks,
    map_file: Arc<UoFile>,
    statics_file: Arc<UoFile>,
    tiledata: Arc<TileData>,
    radar: Arc<RadarColors>,
}

impl TileMap {
    pub(crate) fn new(
        index: u32,
        map_file: Arc<UoFile>,
        statics_file: Arc<UoFile>,
        tiledata: Arc<TileData>,
        radar: Arc<RadarColors>,
    ) -> Result<Self> {
        let size = Self::dimensions(index, &map_file)?;
        let blocks = MapSizeBlocks {
            width: size.width / CELLS_PER_ROW,
            height: size.height / CELLS_PER_COLUMN,
        };
        Ok(Self {
            index,
            size,
            blocks,
            map_file,
            statics_file,
            tiledata,
            radar,
        })
    }

    /// Map dimensions are static per map id; the two Britannia planes are
    /// sniffed for the Mondain's Legacy widening.
    fn dimensions(index: u32, map_file: &UoFile) -> Result<MapSizeCells> {
        let size = match index {
            0 | 1 => {
                let widened = if map_file.is_archive() {
                    // 96 entries of 4096 blocks cover the pre-ML plane.
                    map_file.present_count() > 96
                } else {
                    map_file.backing_len() >= ML_MAP_FILE_SIZE
                };
                if widened {
                    MapSizeCells {
                        width: 7168,
                        height: 4096,
                    }
                } else {
                    MapSizeCells {
                        width: 6144,
                        height: 4096,
                    }
                }
            }
            2 => MapSizeCells {
                width: 2304,
                height: 1600,
            },
            3 => MapSizeCells {
                width: 2560,
                height: 2048,
            },
            4 => MapSizeCells {
                width: 1448,
                height: 1448,
            },
            5 => MapSizeCells {
                width: 1280,
                height: 4096,
            },
            _ => {
                return Err(UoError::out_of_range("map index", index as i64, 0, 6));
            }
        };
        Ok(size)
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn size_blocks(&self) -> MapSizeBlocks {
        self.blocks
    }

    fn block_cells(&self, block: u32) -> Result<[MapCell; CELLS_PER_BLOCK as usize]> {
        let (entry, offset) = block_entry_location(self.map_file.is_archive(), block);
        let mut raw = [0u8; CELLS_PER_BLOCK as usize * 3];
        let read = self.map_file.read_at(entry, &mut raw, offset)?;
        if read < raw.len() {
            return Err(UoError::truncated(
                self.map_file.name(),
                format!("map block {block}"),
            ));
        }
        let mut cells = [MapCell::default(); CELLS_PER_BLOCK as usize];
        for (i, cell) in cells.iter_mut().enumerate() {
            cell.id = u16::from_le_bytes([raw[i * 3], raw[i * 3 + 1]]);
            cell.z = raw[i * 3 + 2] as i8;
        }
        Ok(cells)
    }

    /// Raw static records of a block. A missing index record means the
    /// block simply has none.
    fn block_statics(&self, block: u32) -> Result<Vec<(u16, u8, u8, i8, u16)>> {
        let bytes = match self.statics_file.read_full(block) {
            Ok(bytes) => bytes,
            Err(UoError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let count = bytes.len() / STATIC_RECORD_SIZE;
        let mut records = Vec::with_capacity(count);
        for i in 0..count {
            let r = &bytes[i * STATIC_RECORD_SIZE..(i + 1) * STATIC_RECORD_SIZE];
            records.push((
                u16::from_le_bytes([r[0], r[1]]),
                r[2],
                r[3],
                r[4] as i8,
                u16::from_le_bytes([r[5], r[6]]),
            ));
        }
        Ok(records)
    }

    fn annotate(&self, (id, x, y, z, hue): (u16, u8, u8, i8, u16)) -> MapStatic {
        let info = self.tiledata.static_info(id as u32).ok();
        MapStatic {
            id,
            x,
            y,
            z,
            hue,
            name: info
                .as_ref()
                .map(|i| i.name().clone())
                .unwrap_or_default(),
            flags: info.as_ref().map(|i| i.flags()).unwrap_or_default(),
            height: info.as_ref().map(|i| i.height()).unwrap_or(0),
        }
    }

    fn check_bounds(&self, x: i64, y: i64) -> Result<(u32, u32)> {
        if x < 0 || x >= self.size.width as i64 {
            return Err(UoError::out_of_range(
                "map x",
                x,
                0,
                self.size.width as i64,
            ));
        }
        if y < 0 || y >= self.size.height as i64 {
            return Err(UoError::out_of_range(
                "map y",
                y,
                0,
                self.size.height as i64,
            ));
        }
        Ok((x as u32, y as u32))
    }

    /// The tile at a map coordinate: land id + z plus the statics standing
    /// on it.
    pub fn tile_at(&self, x: i64, y: i64) -> Result<MapTile> {
        let (x, y) = self.check_bounds(x, y)?;
        let block = block_index(x / CELLS_PER_ROW, y / CELLS_PER_COLUMN, self.blocks.height);
        let cells = self.block_cells(block)?;
        let (cell_x, cell_y) = (x % CELLS_PER_ROW, y % CELLS_PER_COLUMN);
        let cell = cells[(cell_y * CELLS_PER_ROW + cell_x) as usize];

        let mut statics: SmallVec<[MapStatic; 4]> = self
            .block_statics(block)?
            .into_iter()
            .filter(|&(_, sx, sy, _, _)| sx as u32 == cell_x && sy as u32 == cell_y)
            .map(|record| self.annotate(record))
            .collect();
        statics.sort_by_key(|s| (s.z, s.y, s.x, s.id));

        Ok(MapTile {
            x,
            y,
            land_id: cell.id,
            z: cell.z,
            land_name: self
                .tiledata
                .land_info(cell.id as u32)
                .map(|info| info.name().clone())
                .unwrap_or_default(),
            statics,
        })
    }

    /// Renders the radar view of a rectangle: per tile, the radar color of
    /// the topmost static if any, else the land color.
    pub fn radar_image(&self, rect: MapRectCells) -> Result<Bitmap16> {
        self.check_bounds(rect.x0 as i64, rect.y0 as i64)?;
        self.check_bounds(
            rect.x0 as i64 + rect.width as i64 - 1,
            rect.y0 as i64 + rect.height as i64 - 1,
        )?;

        let mut image = Bitmap16::new(Rect::new(
            rect.x0 as i32,
            rect.y0 as i32,
            (rect.x0 + rect.width) as i32,
            (rect.y0 + rect.height) as i32,
        ));

        let block_x0 = rect.x0 / CELLS_PER_ROW;
        let block_y0 = rect.y0 / CELLS_PER_COLUMN;
        let block_x1 = (rect.x0 + rect.width - 1) / CELLS_PER_ROW;
        let block_y1 = (rect.y0 + rect.height - 1) / CELLS_PER_COLUMN;

        for block_x in block_x0..=block_x1 {
            for block_y in block_y0..=block_y1 {
                let block = block_index(block_x, block_y, self.blocks.height);
                let cells = self.block_cells(block)?;

                // Topmost static per cell, if any.
                let mut top: [Option<(i8, u16)>; CELLS_PER_BLOCK as usize] =
                    [None; CELLS_PER_BLOCK as usize];
                for (id, sx, sy, z, _hue) in self.block_statics(block)? {
                    let slot = &mut top[(sy as u32 * CELLS_PER_ROW + sx as u32) as usize];
                    if slot.is_none_or(|(best_z, best_id)| (z, id) > (best_z, best_id)) {
                        *slot = Some((z, id));
                    }
                }

                for cell_y in 0..CELLS_PER_COLUMN {
                    for cell_x in 0..CELLS_PER_ROW {
                        let map_x = block_x * CELLS_PER_ROW + cell_x;
                        let map_y = block_y * CELLS_PER_COLUMN + cell_y;
                        let cell = cells[(cell_y * CELLS_PER_ROW + cell_x) as usize];
                        let color = match top[(cell_y * CELLS_PER_ROW + cell_x) as usize] {
                            Some((_, id)) => self.radar.static_item(id as u32),
                            None => self.radar.land(cell.id as u32),
                        };
                        let value = color.map(|c| c.color()).unwrap_or(0);
                        image.set(
                            map_x as i32,
                            map_y as i32,
                            Argb1555::from_value(value).opaque(),
                        );
                    }
                }
            }
        }
        Ok(image)
    }
}
