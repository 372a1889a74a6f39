use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::errors::{IoCtx, Result, UoError};

/// One record of a classic index file: position, byte count and the
/// per-file-type extra word. 12 bytes on disk for almost every index;
/// `skills.idx` pads its records to 16.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct IndexRecord {
    pub lookup: u32, // Position of the element in the related data file.
    pub size: u32,   // Size of the element in bytes.
    pub extra: u32,  // Extra data, used only by some files.
}

impl IndexRecord {
    pub const INVALID_LOOKUP: u32 = 0xFFFF_FFFF;
    pub const PACKED_SIZE: u32 = 4 + 4 + 4;

    /// A hole: never returned as data, skipped in iteration.
    pub fn is_hole(&self) -> bool {
        self.lookup == Self::INVALID_LOOKUP || self.size == 0 || self.extra == Self::INVALID_LOOKUP
    }
}

/// Parses every record of an index file. `stride` is the on-disk record
/// width; anything past the first 12 bytes of a record is skipped.
pub(crate) fn load_index(index_bytes: &[u8], stride: u32, file_name: &str) -> Result<Vec<IndexRecord>> {
    debug_assert!(stride >= IndexRecord::PACKED_SIZE);
    let record_qty = index_bytes.len() / stride as usize;
    let mut records = vec![IndexRecord::default(); record_qty];

    let mut rdr = Cursor::new(index_bytes);
    for (i_elem, record) in records.iter_mut().enumerate() {
        rdr.set_position(i_elem as u64 * stride as u64);
        record.lookup = rdr
            .read_u32::<LittleEndian>()
            .ctx(file_name, "index record lookup")?;
        record.size = rdr
            .read_u32::<LittleEndian>()
            .ctx(file_name, "index record size")?;
        record.extra = rdr
            .read_u32::<LittleEndian>()
            .ctx(file_name, "index record extra")?;
    }
    // Some index files are not an exact multiple of the stride; trailing
    // bytes are unused.
    tracing::debug!(file = file_name, records = record_qty, "loaded index");
    Ok(records)
}

/// Synthesizes records for an index-less data file: `chunk > 0` slices the
/// file into fixed-size entries, otherwise the whole file is entry 0.
pub(crate) fn synthesize_index(data_len: u64, chunk: u32, file_name: &str) -> Result<Vec<IndexRecord>> {
    if chunk > 0 {
        let record_qty = (data_len / chunk as u64) as usize;
        if record_qty == 0 {
            return Err(UoError::EmptyFile {
                file: file_name.to_owned(),
            });
        }
        Ok((0..record_qty)
            .map(|i| IndexRecord {
                lookup: (i as u64 * chunk as u64) as u32,
                size: chunk,
                extra: 0,
            })
            .collect())
    } else {
        Ok(vec![IndexRecord {
            lookup: 0,
            size: u32::try_from(data_len).unwrap_or(u32::MAX),
            extra: 0,
        }])
    }
}
