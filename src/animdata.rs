//! The animdata.mul codec: per-id frame sequencing metadata, 68-byte
//! records in blocks of eight behind a 4-byte header. Loaded once per SDK
//! instance into an owned table.

use byteorder::ReadBytesExt;
use getset::CopyGetters;
use std::io::{Cursor, Read};

use crate::errors::{IoCtx, Result};
use crate::file::UoFile;

const FRAME_SLOTS: usize = 64;
const RECORD_SIZE: usize = FRAME_SLOTS + 4;
const RECORDS_PER_BLOCK: usize = 8;
const BLOCK_SIZE: usize = 4 + RECORDS_PER_BLOCK * RECORD_SIZE; // 548

#[derive(Clone, Debug, CopyGetters)]
pub struct AnimdataEntry {
    frames: [i8; FRAME_SLOTS],
    #[getset(get_copy = "pub")]
    frame_count: u8,
    #[getset(get_copy = "pub")]
    frame_interval: u8,
    #[getset(get_copy = "pub")]
    frame_start: u8,
}

impl AnimdataEntry {
    /// The relative frame offsets actually used by the sequence.
    pub fn frames(&self) -> &[i8] {
        let count = (self.frame_count as usize).min(FRAME_SLOTS);
        &self.frames[..count]
    }
}

/// The whole animdata table, addressed by tile/animation id.
pub struct Animdata {
    entries: Vec<AnimdataEntry>,
}

impl Animdata {
    pub(crate) fn load(file: &UoFile) -> Result<Self> {
        let bytes = file.read_full(0)?;
        let name = file.name();
        let block_qty = bytes.len() / BLOCK_SIZE;
        let mut entries = Vec::with_capacity(block_qty * RECORDS_PER_BLOCK);
        let mut rdr = Cursor::new(&bytes[..]);
        for _ in 0..block_qty {
            let _header = rdr.read_u32::<byteorder::LittleEndian>().ctx(name, "animdata header")?;
            for _ in 0..RECORDS_PER_BLOCK {
                let mut frames = [0u8; FRAME_SLOTS];
                rdr.read_exact(&mut frames).ctx(name, "animdata frames")?;
                let _unknown = rdr.read_u8().ctx(name, "animdata unknown")?;
                let frame_count = rdr.read_u8().ctx(name, "animdata frame count")?;
                let frame_interval = rdr.read_u8().ctx(name, "animdata frame interval")?;
                let frame_start = rdr.read_u8().ctx(name, "animdata frame start")?;
                entries.push(AnimdataEntry {
                    frames: frames.map(|b| b as i8),
                    frame_count,
                    frame_interval,
                    frame_start,
                });
            }
        }
        tracing::debug!(file = name, entries = entries.len(), "loaded animdata table");
        Ok(Self { entries })
    }

    /// The sequencing record for an id, when it animates at all.
    pub fn entry(&self, id: u32) -> Option<&AnimdataEntry> {
        self.entries
            .get(id as usize)
            .filter(|e| e.frame_count > 0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
