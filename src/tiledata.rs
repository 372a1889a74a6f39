//! The tiledata.mul codec: per-tile property records for every land and
//! static id, in two sections of 32-record blocks.

use byteorder::{LittleEndian, ReadBytesExt};
use getset::{CopyGetters, Getters};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::errors::{IoCtx, Result, UoError};
use crate::file::{StructuralDecoder, UoFile};
use crate::utils::name_ascii;

pub const LAND_TILE_MAX: u32 = 0x4000;
pub const STATIC_TILE_MAX: u32 = 0x10000;

/// Entry ids of static records inside the decoded tiledata handle sit past
/// the land section.
pub(crate) const STATIC_ID_BASE: u32 = LAND_TILE_MAX;

const NAME_LEN: usize = 20;
const TILES_PER_BLOCK: u64 = 32;
const LAND_BLOCK_QTY: u64 = 512;

/// The named tile-flag bits. The low dword is the classic set; bits 32..40
/// arrived with the newer clients and are carried verbatim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileFlags(u64);

impl TileFlags {
    pub const BACKGROUND: u64 = 1 << 0;
    pub const WEAPON: u64 = 1 << 1;
    pub const TRANSPARENT: u64 = 1 << 2;
    pub const TRANSLUCENT: u64 = 1 << 3;
    pub const WALL: u64 = 1 << 4;
    pub const DAMAGING: u64 = 1 << 5;
    pub const IMPASSABLE: u64 = 1 << 6;
    pub const WET: u64 = 1 << 7;
    pub const UNKNOWN1: u64 = 1 << 8;
    pub const SURFACE: u64 = 1 << 9;
    pub const BRIDGE: u64 = 1 << 10;
    pub const GENERIC: u64 = 1 << 11;
    pub const WINDOW: u64 = 1 << 12;
    pub const NO_SHOOT: u64 = 1 << 13;
    pub const ARTICLE_A: u64 = 1 << 14;
    pub const ARTICLE_AN: u64 = 1 << 15;
    pub const ARTICLE_THE: u64 = 1 << 16;
    pub const FOLIAGE: u64 = 1 << 17;
    pub const PARTIAL_HUE: u64 = 1 << 18;
    pub const NO_HOUSE: u64 = 1 << 19;
    pub const MAP: u64 = 1 << 20;
    pub const CONTAINER: u64 = 1 << 21;
    pub const WEARABLE: u64 = 1 << 22;
    pub const LIGHT_SOURCE: u64 = 1 << 23;
    pub const ANIMATION: u64 = 1 << 24;
    pub const HOVER_OVER: u64 = 1 << 25;
    pub const NO_DIAGONAL: u64 = 1 << 26;
    pub const ARMOR: u64 = 1 << 27;
    pub const ROOF: u64 = 1 << 28;
    pub const DOOR: u64 = 1 << 29;
    pub const STAIR_BACK: u64 = 1 << 30;
    pub const STAIR_RIGHT: u64 = 1 << 31;
    // High-dword flags; present but opaque across client revisions.
    pub const ALPHA_BLEND: u64 = 1 << 32;
    pub const USE_NEW_ART: u64 = 1 << 33;
    pub const ART_USED: u64 = 1 << 34;
    pub const UNUSED8: u64 = 1 << 35;
    pub const NO_SHADOW: u64 = 1 << 36;
    pub const PIXEL_BLEED: u64 = 1 << 37;
    pub const PLAY_ANIM_ONCE: u64 = 1 << 38;
    pub const MULTI_MOVABLE: u64 = 1 << 40;

    pub fn from_value(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn has(self, flag: u64) -> bool {
        self.0 & flag != 0
    }

    pub fn background(self) -> bool {
        self.has(Self::BACKGROUND)
    }
    pub fn impassable(self) -> bool {
        self.has(Self::IMPASSABLE)
    }
    pub fn wet(self) -> bool {
        self.has(Self::WET)
    }
    pub fn surface(self) -> bool {
        self.has(Self::SURFACE)
    }
    pub fn bridge(self) -> bool {
        self.has(Self::BRIDGE)
    }
    pub fn wearable(self) -> bool {
        self.has(Self::WEARABLE)
    }
    pub fn animated(self) -> bool {
        self.has(Self::ANIMATION)
    }
    pub fn partial_hue(self) -> bool {
        self.has(Self::PARTIAL_HUE)
    }
}

/* Record sizes per client revision. */

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Revision {
    Classic, // land 26, static 37
    HS,      // land 30, static 41, from Stygian Abyss: High Seas on
}

impl Revision {
    fn land_record_size(self) -> u64 {
        match self {
            Revision::Classic => 26,
            Revision::HS => 30,
        }
    }
    fn static_record_size(self) -> u64 {
        match self {
            Revision::Classic => 37,
            Revision::HS => 41,
        }
    }
}

fn section_size(record: u64, blocks: u64) -> u64 {
    (4 + record * TILES_PER_BLOCK) * blocks
}

fn expected_size(revision: Revision, static_blocks: u64) -> u64 {
    section_size(revision.land_record_size(), LAND_BLOCK_QTY)
        + section_size(revision.static_record_size(), static_blocks)
}

fn detect_revision(file_size: u64, name: &str) -> Result<(Revision, u64)> {
    // The revision is recognizable from the exact file size, as the block
    // counts per revision are fixed.
    for (revision, static_blocks) in [
        (Revision::Classic, (0x4000 / TILES_PER_BLOCK)),
        (Revision::HS, 0x8000 / TILES_PER_BLOCK),
        (Revision::HS, 0x10000 / TILES_PER_BLOCK),
    ] {
        if file_size == expected_size(revision, static_blocks) {
            return Ok((revision, static_blocks));
        }
    }
    Err(UoError::invalid(
        name,
        format!("unrecognized tiledata size {file_size}"),
    ))
}

/// The structural decoder: walks both sections and emits one normalized
/// record per tile id (land ids as-is, static ids offset by
/// `STATIC_ID_BASE`). Classic records are widened to the HS layout so the
/// per-tile decoders see a single shape.
pub(crate) fn decoder() -> StructuralDecoder {
    Box::new(|data, name, add| {
        let (revision, static_blocks) = detect_revision(data.len() as u64, name)?;
        tracing::debug!(
            file = name,
            ?revision,
            static_tiles = static_blocks * TILES_PER_BLOCK,
            "detected tiledata revision"
        );
        let mut rdr = Cursor::new(data);

        let read_flags = |rdr: &mut Cursor<&[u8]>, what: &str| -> Result<u64> {
            Ok(match revision {
                Revision::Classic => rdr.read_u32::<LittleEndian>().ctx(name, what)? as u64,
                Revision::HS => rdr.read_u64::<LittleEndian>().ctx(name, what)?,
            })
        };

        let mut i_tile: u32 = 0;
        for _i_block in 0..LAND_BLOCK_QTY {
            let _header = rdr.read_u32::<LittleEndian>().ctx(name, "land block header")?;
            for _ in 0..TILES_PER_BLOCK {
                let flags = read_flags(&mut rdr, "land flags")?;
                let texture_id = rdr.read_u16::<LittleEndian>().ctx(name, "texture id")?;
                let mut record = Vec::with_capacity(30);
                record.extend_from_slice(&flags.to_le_bytes());
                record.extend_from_slice(&texture_id.to_le_bytes());
                let mut tail = [0u8; NAME_LEN];
                rdr.read_exact(&mut tail).ctx(name, "land name")?;
                record.extend_from_slice(&tail);
                add(i_tile, 0, record);
                i_tile += 1;
            }
        }

        i_tile = 0;
        for _i_block in 0..static_blocks {
            let _header = rdr
                .read_u32::<LittleEndian>()
                .ctx(name, "static block header")?;
            for _ in 0..TILES_PER_BLOCK {
                let flags = read_flags(&mut rdr, "static flags")?;
                let mut record = Vec::with_capacity(41);
                record.extend_from_slice(&flags.to_le_bytes());
                let mut tail = [0u8; 13 + NAME_LEN];
                rdr.read_exact(&mut tail).ctx(name, "static record")?;
                record.extend_from_slice(&tail);
                add(STATIC_ID_BASE + i_tile, 0, record);
                i_tile += 1;
            }
        }

        Ok(())
    })
}

/* Start of decoded per-tile structs */

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct LandTileInfo {
    #[getset(get_copy = "pub")]
    id: u32,
    #[getset(get_copy = "pub")]
    flags: TileFlags,
    #[getset(get_copy = "pub")]
    texture_id: u16,
    #[getset(get = "pub")]
    name: String,
}

impl LandTileInfo {
    fn decode(id: u32, bytes: &[u8], file: &str) -> Result<Self> {
        if bytes.len() < 30 {
            return Err(UoError::truncated(file, format!("land record {id}")));
        }
        Ok(Self {
            id,
            flags: TileFlags::from_value(u64::from_le_bytes(bytes[0..8].try_into().unwrap())),
            texture_id: u16::from_le_bytes(bytes[8..10].try_into().unwrap()),
            name: name_ascii(&bytes[10..30]).to_owned(),
        })
    }
}

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct StaticTileInfo {
    #[getset(get_copy = "pub")]
    id: u32,
    #[getset(get_copy = "pub")]
    flags: TileFlags,
    #[getset(get_copy = "pub")]
    weight: u8, // 255 means not movable
    #[getset(get_copy = "pub")]
    quality: u8, // layer for wearables, light id for light sources
    #[getset(get_copy = "pub")]
    misc: i16,
    #[getset(get_copy = "pub")]
    quantity: u8,
    #[getset(get_copy = "pub")]
    animation: i16,
    #[getset(get_copy = "pub")]
    hue: u8,
    #[getset(get_copy = "pub")]
    stacking_offset: u8,
    #[getset(get_copy = "pub")]
    value: u8,
    height: i8,
    #[getset(get = "pub")]
    name: String,
}

impl StaticTileInfo {
    fn decode(id: u32, bytes: &[u8], file: &str) -> Result<Self> {
        if bytes.len() < 41 {
            return Err(UoError::truncated(file, format!("static record {id}")));
        }
        let mut rdr = Cursor::new(&bytes[8..]);
        let weight = rdr.read_u8().ctx(file, "weight")?;
        let quality = rdr.read_u8().ctx(file, "quality")?;
        let misc = rdr.read_i16::<LittleEndian>().ctx(file, "misc")?;
        let _unk2 = rdr.read_u8().ctx(file, "unk2")?;
        let quantity = rdr.read_u8().ctx(file, "quantity")?;
        let animation = rdr.read_i16::<LittleEndian>().ctx(file, "animation")?;
        let _unk3 = rdr.read_u8().ctx(file, "unk3")?;
        let hue = rdr.read_u8().ctx(file, "hue")?;
        let stacking_offset = rdr.read_u8().ctx(file, "stacking offset")?;
        let value = rdr.read_u8().ctx(file, "value")?;
        let height = rdr.read_i8().ctx(file, "height")?;
        Ok(Self {
            id,
            flags: TileFlags::from_value(u64::from_le_bytes(bytes[0..8].try_into().unwrap())),
            weight,
            quality,
            misc,
            quantity,
            animation,
            hue,
            stacking_offset,
            value,
            height,
            name: name_ascii(&bytes[21..41]).to_owned(),
        })
    }

    /// Walking height: bridges count half their stored height.
    pub fn height(&self) -> i8 {
        if self.flags.bridge() {
            self.height / 2
        } else {
            self.height
        }
    }

    pub fn height_raw(&self) -> i8 {
        self.height
    }

    pub fn gump_id_male(&self) -> u32 {
        self.animation as u32 + 50_000
    }

    pub fn gump_id_female(&self) -> u32 {
        self.animation as u32 + 60_000
    }
}

/* Start of TileData struct */

/// Decoded tiledata handle: `land_info(id)` and `static_info(id)` over the
/// structurally decoded entry table.
pub struct TileData {
    file: Arc<UoFile>,
}

impl TileData {
    pub(crate) fn new(file: Arc<UoFile>) -> Self {
        Self { file }
    }

    pub fn land_info(&self, id: u32) -> Result<LandTileInfo> {
        if id >= LAND_TILE_MAX {
            return Err(UoError::out_of_range(
                "land tile id",
                id as i64,
                0,
                LAND_TILE_MAX as i64,
            ));
        }
        self.file
            .decode(id, |bytes, _extra| LandTileInfo::decode(id, bytes, self.file.name()))
    }

    pub fn static_info(&self, id: u32) -> Result<StaticTileInfo> {
        if id >= STATIC_TILE_MAX {
            return Err(UoError::out_of_range(
                "static tile id",
                id as i64,
                0,
                STATIC_TILE_MAX as i64,
            ));
        }
        self.file.decode(STATIC_ID_BASE + id, |bytes, _extra| {
            StaticTileInfo::decode(id, bytes, self.file.name())
        })
    }

    /// Highest static id the opened file actually carries.
    pub fn static_count(&self) -> u32 {
        self.file
            .ids()
            .last()
            .map(|last| last.saturating_sub(STATIC_ID_BASE) + 1)
            .unwrap_or(0)
    }

    pub fn land_iter(&self) -> impl Iterator<Item = LandTileInfo> + '_ {
        self.file
            .ids()
            .take_while(|&id| id < LAND_TILE_MAX)
            .filter_map(|id| self.land_info(id).ok())
    }

    pub fn static_iter(&self) -> impl Iterator<Item = StaticTileInfo> + '_ {
        self.file
            .ids()
            .skip_while(|&id| id < STATIC_ID_BASE)
            .filter_map(|id| self.static_info(id - STATIC_ID_BASE).ok())
    }
}
