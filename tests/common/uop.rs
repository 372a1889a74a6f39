//! A minimal archive writer for the suite, with its own transcription of
//! the legacy path hash so reader and fixture stay independent.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

const MAGIC: u32 = 0x0050_594D;

pub fn hash_path(path: &[u8]) -> u64 {
    let len = path.len();
    let seed = 0xDEAD_BEEFu32.wrapping_add(len as u32);
    let (mut a, mut b, mut c) = (seed, seed, seed);

    let mut i = 0usize;
    while i + 12 < len {
        let word = |o: usize| {
            u32::from_le_bytes([path[i + o], path[i + o + 1], path[i + o + 2], path[i + o + 3]])
        };
        b = word(4).wrapping_add(b);
        c = word(8).wrapping_add(c);
        let mut d = word(0).wrapping_sub(c);
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
    if rem == 0 {
        return ((c as u64) << 32) | b as u64;
    }
    for (slot, target) in [&mut a, &mut b, &mut c].into_iter().enumerate() {
        let base = slot * 4;
        for j in 0..4 {
            if rem >= base + j + 1 {
                *target = target.wrapping_add((path[i + base + j] as u32) << (8 * j));
            }
        }
    }
    c = (c ^ b).wrapping_sub((b >> 18) ^ (b << 14));
    let x = (c ^ a).wrapping_sub((c >> 21) ^ (c << 11));
    b = (b ^ x).wrapping_sub((x >> 7) ^ (x << 25));
    c = (c ^ b).wrapping_sub((b >> 16) ^ (b << 16));
    let d = (c ^ x).wrapping_sub((c >> 28) ^ (c << 4));
    b = (b ^ d).wrapping_sub((d >> 18) ^ (d << 14));
    c = (c ^ b).wrapping_sub((b >> 8) ^ (b << 24));
    ((b as u64) << 32) | c as u64
}

fn adler32(data: &[u8]) -> u32 {
    const MOD: u32 = 65_521;
    let mut a: u32 = 1;
    let mut b: u32 = 0;
    for &byte in data {
        a = (a + byte as u32) % MOD;
        b = (b + a) % MOD;
    }
    (b << 16) | a
}

fn zlib(raw: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(raw).unwrap();
    enc.finish().unwrap()
}

/// Writes a single-block archive of (logical path, payload, compress?)
/// triples.
pub fn build_uop(entries: &[(String, Vec<u8>, bool)]) -> Vec<u8> {
    let block_off = 40usize;
    let records_off = block_off + 12;
    let data_start = records_off + entries.len() * 34;

    let blobs: Vec<Vec<u8>> = entries
        .iter()
        .map(|(_, raw, compress)| if *compress { zlib(raw) } else { raw.clone() })
        .collect();

    let mut out: Vec<u8> = Vec::new();
    out.write_u32::<LittleEndian>(MAGIC).unwrap();
    out.write_u32::<LittleEndian>(5).unwrap();
    out.write_u32::<LittleEndian>(0xFD23_EC43).unwrap();
    out.write_u64::<LittleEndian>(block_off as u64).unwrap();
    out.write_u32::<LittleEndian>(100).unwrap();
    out.write_u32::<LittleEndian>(entries.len() as u32).unwrap();
    out.resize(block_off, 0);

    out.write_u32::<LittleEndian>(entries.len() as u32).unwrap();
    out.write_i64::<LittleEndian>(0).unwrap();

    let mut cursor = data_start as u64;
    for ((path, raw, compress), blob) in entries.iter().zip(&blobs) {
        out.write_u64::<LittleEndian>(cursor).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(blob.len() as u32).unwrap();
        out.write_u32::<LittleEndian>(raw.len() as u32).unwrap();
        out.write_u64::<LittleEndian>(hash_path(path.as_bytes())).unwrap();
        out.write_u32::<LittleEndian>(adler32(blob)).unwrap();
        out.write_u16::<LittleEndian>(if *compress { 1 } else { 0 }).unwrap();
        cursor += blob.len() as u64;
    }
    for blob in &blobs {
        out.extend_from_slice(blob);
    }
    out
}
