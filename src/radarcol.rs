//! The radarcol.mul codec: one 16-bit color per land and static id, used
//! by the client's radar map.

use getset::CopyGetters;
use std::sync::Arc;

use crate::errors::{Result, UoError};
use crate::file::UoFile;
use crate::tiledata::LAND_TILE_MAX;

pub const RADAR_ENTRY_QTY: u32 = 0x8000;

/// A radar color: the blob index (land ids as-is, static ids offset by
/// 0x4000) and the stored 16-bit color.
#[derive(Clone, Copy, Debug, CopyGetters)]
pub struct RadarColor {
    #[getset(get_copy = "pub")]
    id: u32,
    #[getset(get_copy = "pub")]
    color: u16,
}

impl RadarColor {
    /// Id and color packed into one 64-bit word.
    pub fn packed(self) -> u64 {
        (self.id as u64) << 16 | self.color as u64
    }
}

/// Reader over the single-blob radar color table.
pub struct RadarColors {
    file: Arc<UoFile>,
}

impl RadarColors {
    pub(crate) fn new(file: Arc<UoFile>) -> Self {
        Self { file }
    }

    fn entry(&self, id: u32) -> Result<RadarColor> {
        let mut raw = [0u8; 2];
        let read = self.file.read_at(0, &mut raw, id as u64 * 2)?;
        if read < 2 {
            return Err(UoError::truncated(
                self.file.name(),
                format!("radar color {id}"),
            ));
        }
        Ok(RadarColor {
            id,
            color: u16::from_le_bytes(raw),
        })
    }

    /// The radar color of a land tile.
    pub fn land(&self, id: u32) -> Result<RadarColor> {
        if id >= LAND_TILE_MAX {
            return Err(UoError::out_of_range(
                "land radar id",
                id as i64,
                0,
                LAND_TILE_MAX as i64,
            ));
        }
        self.entry(id)
    }

    /// The radar color of a static tile.
    pub fn static_item(&self, id: u32) -> Result<RadarColor> {
        if id >= RADAR_ENTRY_QTY - LAND_TILE_MAX {
            return Err(UoError::out_of_range(
                "static radar id",
                id as i64,
                0,
                (RADAR_ENTRY_QTY - LAND_TILE_MAX) as i64,
            ));
        }
        self.entry(LAND_TILE_MAX + id)
    }

    pub fn iter(&self) -> impl Iterator<Item = RadarColor> + '_ {
        (0..RADAR_ENTRY_QTY).filter_map(|id| self.entry(id).ok())
    }
}
