use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::HashMap;
use std::io::Cursor;

use crate::errors::{IoCtx, Result, UoError};

/// "MYP\0", the archive magic.
pub(crate) const UOP_MAGIC: u32 = 0x0050_594D;

/// One parsed archive record. Offsets point into the mapped file; the data
/// block itself starts `header_length` bytes past `data_offset`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct UopRecord {
    pub data_offset: u64,
    pub header_length: u32,
    pub compressed_length: u32,
    pub decompressed_length: u32,
    pub adler32: u32,
    pub compression: u16, // 0 = none, 1 = zlib
}

/// Walks the header and block chain, producing the hash -> record table.
pub(crate) fn parse_archive(data: &[u8], file_name: &str) -> Result<HashMap<u64, UopRecord>> {
    let mut rdr = Cursor::new(data);

    let magic = rdr.read_u32::<LittleEndian>().ctx(file_name, "magic")?;
    if magic != UOP_MAGIC {
        return Err(UoError::invalid(
            file_name,
            format!("bad archive magic 0x{magic:08X}"),
        ));
    }
    let _version = rdr.read_u32::<LittleEndian>().ctx(file_name, "version")?;
    let _misc = rdr.read_u32::<LittleEndian>().ctx(file_name, "misc")?;
    let first_block = rdr
        .read_u64::<LittleEndian>()
        .ctx(file_name, "first block offset")?;
    let _block_capacity = rdr
        .read_u32::<LittleEndian>()
        .ctx(file_name, "entries per block")?;
    let declared_count = rdr
        .read_u32::<LittleEndian>()
        .ctx(file_name, "total entry count")?;

    // The declared count sizes the map but is never trusted for reads.
    let mut records = HashMap::with_capacity((declared_count as usize).min(0x10_0000));
    let mut next_block = first_block as i64;
    while next_block > 0 {
        if next_block as u64 >= data.len() as u64 {
            return Err(UoError::invalid(
                file_name,
                format!("block offset {next_block} past end of file"),
            ));
        }
        rdr.set_position(next_block as u64);
        let files_in_block = rdr
            .read_u32::<LittleEndian>()
            .ctx(file_name, "block entry count")?;
        next_block = rdr
            .read_i64::<LittleEndian>()
            .ctx(file_name, "next block offset")?;

        for _ in 0..files_in_block {
            let data_offset = rdr.read_u64::<LittleEndian>().ctx(file_name, "data offset")?;
            let header_length = rdr
                .read_u32::<LittleEndian>()
                .ctx(file_name, "header length")?;
            let compressed_length = rdr
                .read_u32::<LittleEndian>()
                .ctx(file_name, "compressed length")?;
            let decompressed_length = rdr
                .read_u32::<LittleEndian>()
                .ctx(file_name, "decompressed length")?;
            let hash = rdr.read_u64::<LittleEndian>().ctx(file_name, "entry hash")?;
            let adler32 = rdr.read_u32::<LittleEndian>().ctx(file_name, "adler32")?;
            let compression = rdr.read_u16::<LittleEndian>().ctx(file_name, "flags")?;

            // Blocks are fixed-capacity; unused slots are zeroed.
            if data_offset == 0 && hash == 0 {
                continue;
            }
            records.insert(
                hash,
                UopRecord {
                    data_offset,
                    header_length,
                    compressed_length,
                    decompressed_length,
                    adler32,
                    compression,
                },
            );
        }
    }

    tracing::debug!(file = file_name, entries = records.len(), "parsed archive");
    Ok(records)
}

/// Formats the logical path an asset id lives under, e.g.
/// `build/gumpartlegacymul/00000123`.
pub(crate) fn entry_path(stem: &str, digits: usize, id: u32) -> String {
    format!("build/{stem}/{id:0width$}", width = digits)
}

/// The archive's 64-bit path hash: a lookup3-style mix of two 32-bit
/// halves, reproduced bit-exactly from the legacy client.
pub(crate) fn uop_hash(path: &[u8]) -> u64 {
    let len = path.len();
    let mut a: u32;
    let mut b: u32;
    let mut c: u32;
    a = 0xDEAD_BEEFu32.wrapping_add(len as u32);
    b = a;
    c = a;

    let mut i = 0usize;
    while i + 12 < len {
        let w0 = u32::from_le_bytes([path[i], path[i + 1], path[i + 2], path[i + 3]]);
        let w1 = u32::from_le_bytes([path[i + 4], path[i + 5], path[i + 6], path[i + 7]]);
        let w2 = u32::from_le_bytes([path[i + 8], path[i + 9], path[i + 10], path[i + 11]]);

        b = w1.wrapping_add(b);
        c = w2.wrapping_add(c);
        let mut d = w0.wrapping_sub(c);
        d = d.wrapping_add(a) ^ (c >> 28) ^ (c << 4);
        c = c.wrapping_add(b);
        b = b.wrapping_sub(d) ^ (d >> 26) ^ (d << 6);
        d = d.wrapping_add(c);
        c = c.wrapping_sub(b) ^ (b >> 24) ^ (b << 8);
        b = b.wrapping_add(d);
        a = d.wrapping_sub(c) ^ (c >> 16) ^ (c << 16);
        c = c.wrapping_add(b);
        b = b.wrapping_sub(a) ^ (a >> 13) ^ (a << 19);
        a = a.wrapping_add(c);
        c = c.wrapping_sub(b) ^ (b >> 28) ^ (b << 4);
        b = b.wrapping_add(a);

        i += 12;
    }

    let rem = len - i;
    if rem > 0 {
        if rem >= 12 {
            c = c.wrapping_add((path[i + 11] as u32) << 24);
        }
        if rem >= 11 {
            c = c.wrapping_add((path[i + 10] as u32) << 16);
        }
        if rem >= 10 {
            c = c.wrapping_add((path[i + 9] as u32) << 8);
        }
        if rem >= 9 {
            c = c.wrapping_add(path[i + 8] as u32);
        }
        if rem >= 8 {
            b = b.wrapping_add((path[i + 7] as u32) << 24);
        }
        if rem >= 7 {
            b = b.wrapping_add((path[i + 6] as u32) << 16);
        }
        if rem >= 6 {
            b = b.wrapping_add((path[i + 5] as u32) << 8);
        }
        if rem >= 5 {
            b = b.wrapping_add(path[i + 4] as u32);
        }
        if rem >= 4 {
            a = a.wrapping_add((path[i + 3] as u32) << 24);
        }
        if rem >= 3 {
            a = a.wrapping_add((path[i + 2] as u32) << 16);
        }
        if rem >= 2 {
            a = a.wrapping_add((path[i + 1] as u32) << 8);
        }
        a = a.wrapping_add(path[i] as u32);

        c = (c ^ b).wrapping_sub((b >> 18) ^ (b << 14));
        let x = (c ^ a).wrapping_sub((c >> 21) ^ (c << 11));
        b = (b ^ x).wrapping_sub((x >> 7) ^ (x << 25));
        c = (c ^ b).wrapping_sub((b >> 16) ^ (b << 16));
        let d = (c ^ x).wrapping_sub((c >> 28) ^ (c << 4));
        b = (b ^ d).wrapping_sub((d >> 18) ^ (d << 14));
        c = (c ^ b).wrapping_sub((b >> 8) ^ (b << 24));
        return ((b as u64) << 32) | c as u64;
    }
    ((c as u64) << 32) | b as u64
}

/// Plain adler32, for the optional per-entry verification of the stored
/// (still-compressed) data block.
pub(crate) fn adler32(data: &[u8]) -> u32 {
    const MOD: u32 = 65_521;
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    for chunk in data.chunks(5552) {
        for &byte in chunk {
            a += byte as u32;
            b += a;
        }
        a %= MOD;
        b %= MOD;
    }
    (b << 16) | a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_paths_are_zero_padded() {
        assert_eq!(entry_path("gumpartlegacymul", 8, 0x123), "build/gumpartlegacymul/00000291");
        assert_eq!(entry_path("multicollection", 6, 0), "build/multicollection/000000");
    }

    // Fixture pairs captured from a reference transcription of the legacy
    // algorithm; any drift in the mixing constants shows up here.
    #[test]
    fn hash_matches_captured_fixtures() {
        let fixtures: &[(&str, u64)] = &[
            ("build/artlegacymul/00000000", 0xC5F4_118C_F16E_69B1),
            ("build/artlegacymul/00004000", 0x1297_1948_0FE2_FF8E),
            ("build/gumpartlegacymul/00000000", 0x0E8F_EE3C_E952_E3D7),
            ("build/gumpartlegacymul/00000123", 0x71ED_358F_DC27_296F),
            ("build/map0legacymul/00000000", 0x02EE_6A42_C67B_1940),
            ("build/soundlegacymul/00000001", 0xF721_A618_EB1B_7605),
            ("build/multicollection/000000", 0x56C5_A3D9_BE94_DA83),
        ];
        for (path, expected) in fixtures {
            assert_eq!(uop_hash(path.as_bytes()), *expected, "path {path}");
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let path = b"build/map1legacymul/00000042";
        assert_eq!(uop_hash(path), uop_hash(path));
    }

    #[test]
    fn adler32_known_values() {
        assert_eq!(adler32(b""), 1);
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let data = vec![0u8; 64];
        assert!(matches!(
            parse_archive(&data, "bad.uop"),
            Err(UoError::InvalidFormat { .. })
        ));
    }
}
