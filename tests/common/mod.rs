//! Synthesizes a miniature client directory for the integration suite.
#![allow(dead_code)]

pub mod uop;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::path::Path;

pub const LAND_NAME: &str = "muck";
pub const STATIC_ID: u32 = 0x0E3D;
pub const STATIC_NAME: &str = "crystal";

/// Tokuno-sized map plane (1448x1448) with one interesting tile.
pub const MAP_INDEX: u32 = 4;
pub const MAP_SIDE: u32 = 1448;
pub const TILE_X: u32 = 536;
pub const TILE_Y: u32 = 970;
pub const TILE_LAND_ID: u16 = 0x409;
pub const TILE_STATICS: [u16; 2] = [0x5CF, 0xAB3];

const INVALID: u32 = 0xFFFF_FFFF;

fn write(dir: &Path, name: &str, bytes: Vec<u8>) {
    std::fs::write(dir.join(name), bytes).unwrap();
}

/// artidx/art.mul: land tile 0 and static STATIC_ID present, all else
/// holes.
fn build_art(dir: &Path) {
    let mut land = Vec::new();
    for _ in 0..1024 {
        land.write_u16::<LittleEndian>(0x1F).unwrap();
    }

    // Static art: 8x4 pixels, per row 2 transparent then 3 colored.
    let mut stat = Vec::new();
    stat.write_u32::<LittleEndian>(0).unwrap();
    stat.write_u16::<LittleEndian>(8).unwrap();
    stat.write_u16::<LittleEndian>(4).unwrap();
    for y in 0..4u16 {
        stat.write_u16::<LittleEndian>(y * 7).unwrap();
    }
    for _ in 0..4 {
        stat.write_u16::<LittleEndian>(2).unwrap();
        stat.write_u16::<LittleEndian>(3).unwrap();
        for _ in 0..3 {
            stat.write_u16::<LittleEndian>(0x1234).unwrap();
        }
        stat.write_u16::<LittleEndian>(0).unwrap();
        stat.write_u16::<LittleEndian>(0).unwrap();
    }

    let static_entry = 0x4000 + STATIC_ID;
    let mut data = Vec::new();
    let mut idx = Vec::new();
    for id in 0..=static_entry {
        let payload: Option<&[u8]> = match id {
            0 => Some(&land),
            _ if id == static_entry => Some(&stat),
            _ => None,
        };
        match payload {
            Some(p) => {
                idx.write_u32::<LittleEndian>(data.len() as u32).unwrap();
                idx.write_u32::<LittleEndian>(p.len() as u32).unwrap();
                idx.write_u32::<LittleEndian>(0).unwrap();
                data.extend_from_slice(p);
            }
            None => {
                idx.write_u32::<LittleEndian>(INVALID).unwrap();
                idx.write_u32::<LittleEndian>(0).unwrap();
                idx.write_u32::<LittleEndian>(0).unwrap();
            }
        }
    }
    write(dir, "art.mul", data);
    write(dir, "artidx.mul", idx);
}

/// Classic-revision tiledata with names on the ids the suite touches.
fn build_tiledata(dir: &Path) {
    let mut out = Vec::new();
    for block in 0..512u32 {
        out.write_u32::<LittleEndian>(0).unwrap();
        for slot in 0..32u32 {
            let id = block * 32 + slot;
            out.write_u32::<LittleEndian>(0).unwrap(); // flags
            out.write_u16::<LittleEndian>(id as u16).unwrap();
            let mut name = [0u8; 20];
            if id == 0 {
                name[..LAND_NAME.len()].copy_from_slice(LAND_NAME.as_bytes());
            }
            out.extend_from_slice(&name);
        }
    }
    for block in 0..512u32 {
        out.write_u32::<LittleEndian>(0).unwrap();
        for slot in 0..32u32 {
            let id = block * 32 + slot;
            out.write_u32::<LittleEndian>(0x40).unwrap(); // impassable
            out.write_u8(1).unwrap(); // weight
            out.write_u8(0).unwrap();
            out.write_i16::<LittleEndian>(0).unwrap();
            out.write_u8(0).unwrap();
            out.write_u8(1).unwrap();
            out.write_i16::<LittleEndian>(0).unwrap();
            out.write_u8(0).unwrap();
            out.write_u8(0).unwrap();
            out.write_u8(0).unwrap();
            out.write_u8(0).unwrap();
            out.write_i8(3).unwrap(); // height
            let mut name = [0u8; 20];
            let slot_name = match id {
                _ if id == STATIC_ID => STATIC_NAME,
                0x5CF => "stone",
                0xAB3 => "post",
                _ => "",
            };
            name[..slot_name.len()].copy_from_slice(slot_name.as_bytes());
            out.extend_from_slice(&name);
        }
    }
    write(dir, "tiledata.mul", out);
}

/// gumpart/gumpidx: gump 5 is 10x4 of a solid color, dimensions in the
/// classic extra packing.
fn build_gumps(dir: &Path) {
    let (width, height) = (10u16, 4u16);
    let mut payload = Vec::new();
    for y in 0..height as u32 {
        payload.write_u32::<LittleEndian>(y).unwrap();
    }
    for _ in 0..height {
        payload.write_u16::<LittleEndian>(0x801F).unwrap();
        payload.write_u16::<LittleEndian>(width).unwrap();
    }

    let mut data = Vec::new();
    let mut idx = Vec::new();
    for id in 0..=5u32 {
        if id == 5 {
            idx.write_u32::<LittleEndian>(data.len() as u32).unwrap();
            idx.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            idx.write_u32::<LittleEndian>(width as u32 | (height as u32) << 16)
                .unwrap();
            data.extend_from_slice(&payload);
        } else {
            idx.write_u32::<LittleEndian>(INVALID).unwrap();
            idx.write_u32::<LittleEndian>(0).unwrap();
            idx.write_u32::<LittleEndian>(0).unwrap();
        }
    }
    write(dir, "gumpart.mul", data);
    write(dir, "gumpidx.mul", idx);
}

/// map4 + statics4/staidx4 with the worked tile.
fn build_map(dir: &Path) {
    let blocks_per_side = MAP_SIDE / 8;
    let block_qty = (blocks_per_side * blocks_per_side) as usize;
    let mut map = vec![0u8; block_qty * 196];

    let block_index = (TILE_X / 8) * blocks_per_side + TILE_Y / 8;
    let cell = ((TILE_Y % 8) * 8 + TILE_X % 8) as usize;
    let tile_off = block_index as usize * 196 + 4 + cell * 3;
    map[tile_off..tile_off + 2].copy_from_slice(&TILE_LAND_ID.to_le_bytes());
    map[tile_off + 2] = 0; // z

    let mut statics = Vec::new();
    for id in TILE_STATICS {
        statics.write_u16::<LittleEndian>(id).unwrap();
        statics.write_u8((TILE_X % 8) as u8).unwrap();
        statics.write_u8((TILE_Y % 8) as u8).unwrap();
        statics.write_i8(0).unwrap();
        statics.write_u16::<LittleEndian>(0).unwrap();
    }

    let mut staidx = Vec::new();
    for block in 0..block_qty as u32 {
        if block == block_index {
            staidx.write_u32::<LittleEndian>(0).unwrap();
            staidx.write_u32::<LittleEndian>(statics.len() as u32).unwrap();
            staidx.write_u32::<LittleEndian>(0).unwrap();
        } else {
            staidx.write_u32::<LittleEndian>(INVALID).unwrap();
            staidx.write_u32::<LittleEndian>(0).unwrap();
            staidx.write_u32::<LittleEndian>(0).unwrap();
        }
    }

    write(dir, &format!("map{MAP_INDEX}.mul"), map);
    write(dir, &format!("statics{MAP_INDEX}.mul"), statics);
    write(dir, &format!("staidx{MAP_INDEX}.mul"), staidx);
}

/// All 3000 hues; hue 1337 is named "royal".
fn build_hues(dir: &Path) {
    let mut out = Vec::new();
    for block in 0..375u32 {
        out.write_u32::<LittleEndian>(0).unwrap();
        for slot in 0..8u32 {
            let index = block * 8 + slot;
            for j in 0..32u32 {
                out.write_u16::<LittleEndian>(((index.wrapping_mul(3) + j) & 0x7FFF) as u16)
                    .unwrap();
            }
            out.write_u16::<LittleEndian>(2).unwrap();
            out.write_u16::<LittleEndian>(30).unwrap();
            let mut name = [0u8; 20];
            if index == 1337 {
                name[..5].copy_from_slice(b"royal");
            }
            out.extend_from_slice(&name);
        }
    }
    write(dir, "hues.mul", out);
}

fn build_cliloc(dir: &Path) {
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(2).unwrap();
    out.write_u16::<LittleEndian>(1).unwrap();
    for (id, text) in [(3u32, "gold"), (1_000_000, "You see nothing special.")] {
        out.write_i32::<LittleEndian>(id as i32).unwrap();
        out.write_u8(0).unwrap();
        out.write_i16::<LittleEndian>(text.len() as i16).unwrap();
        out.extend_from_slice(text.as_bytes());
    }
    write(dir, "Cliloc.enu", out);
}

fn build_speech(dir: &Path) {
    let mut out = Vec::new();
    for (id, text) in [(5i16, "vendor buy"), (5, "vendor sell"), (12, "guards")] {
        out.write_i16::<BigEndian>(id).unwrap();
        out.write_i16::<BigEndian>(text.len() as i16).unwrap();
        out.extend_from_slice(text.as_bytes());
    }
    write(dir, "speech.mul", out);
}

fn build_radarcol(dir: &Path) {
    let mut out = Vec::with_capacity(0x8000 * 2);
    for i in 0..0x8000u32 {
        out.write_u16::<LittleEndian>((i & 0x7FFF) as u16).unwrap();
    }
    write(dir, "radarcol.mul", out);
}

/// skills.mul with the 16-byte-stride index.
fn build_skills(dir: &Path) {
    let names: [(&str, bool); 3] = [("Alchemy", true), ("Anatomy", true), ("Animal Lore", false)];
    let mut data = Vec::new();
    let mut idx = Vec::new();
    for (name, is_action) in names {
        let start = data.len() as u32;
        data.push(is_action as u8);
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        idx.write_u32::<LittleEndian>(start).unwrap();
        idx.write_u32::<LittleEndian>((data.len() as u32) - start).unwrap();
        idx.write_u32::<LittleEndian>(0).unwrap();
        idx.write_u32::<LittleEndian>(0).unwrap(); // stride padding
    }
    write(dir, "skills.mul", data);
    write(dir, "skills.idx", idx);

    let mut grp = Vec::new();
    grp.write_i32::<LittleEndian>(3).unwrap();
    for name in ["Combat", "Magic"] {
        let mut raw = [0u8; 17];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        grp.extend_from_slice(&raw);
    }
    for group in [1i32, 1, 2] {
        grp.write_i32::<LittleEndian>(group).unwrap();
    }
    write(dir, "skillgrp.mul", grp);
}

fn build_lights(dir: &Path) {
    let (width, height) = (4u32, 4u32);
    let mut data = Vec::new();
    for i in 0..width * height {
        data.push((i % 32) as u8);
    }
    let mut idx = Vec::new();
    idx.write_u32::<LittleEndian>(0).unwrap();
    idx.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    idx.write_u32::<LittleEndian>(width | height << 16).unwrap();
    write(dir, "light.mul", data);
    write(dir, "lightidx.mul", idx);
}

fn build_textures(dir: &Path) {
    let mut data = Vec::new();
    let mut idx = Vec::new();
    // Texture 0: 64x64 (extra 0); texture 1: 128x128 (extra 1).
    for (dimension, extra) in [(64u32, 0u32), (128, 1)] {
        let start = data.len() as u32;
        for _ in 0..dimension * dimension {
            data.write_u16::<LittleEndian>(0x2345).unwrap();
        }
        idx.write_u32::<LittleEndian>(start).unwrap();
        idx.write_u32::<LittleEndian>(dimension * dimension * 2).unwrap();
        idx.write_u32::<LittleEndian>(extra).unwrap();
    }
    write(dir, "texmaps.mul", data);
    write(dir, "texidx.mul", idx);
}

fn build_sounds(dir: &Path) {
    let mut data = vec![0u8; 32];
    data[..9].copy_from_slice(b"bell.wav\0");
    for s in [100i16, -100, 2000, -2000] {
        data.write_i16::<LittleEndian>(s).unwrap();
    }
    let mut idx = Vec::new();
    idx.write_u32::<LittleEndian>(0).unwrap();
    idx.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    idx.write_u32::<LittleEndian>(1).unwrap();
    write(dir, "sound.mul", data);
    write(dir, "soundidx.mul", idx);
}

fn build_multis(dir: &Path) {
    let mut data = Vec::new();
    for (x, y) in [(0i16, 0i16), (1, 0)] {
        data.write_u16::<LittleEndian>(STATIC_ID as u16).unwrap();
        data.write_i16::<LittleEndian>(x).unwrap();
        data.write_i16::<LittleEndian>(y).unwrap();
        data.write_i16::<LittleEndian>(0).unwrap();
        data.write_u32::<LittleEndian>(1).unwrap();
        data.write_u32::<LittleEndian>(0).unwrap();
    }
    let mut idx = Vec::new();
    idx.write_u32::<LittleEndian>(0).unwrap();
    idx.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    idx.write_u32::<LittleEndian>(0).unwrap();
    write(dir, "multi.mul", data);
    write(dir, "multi.idx", idx);
}

/// anim.mul entry 110 (body 1, action 0, direction 0): one 4x1 frame.
fn build_anim(dir: &Path) {
    let mut payload = Vec::new();
    for i in 0..256u16 {
        payload
            .write_u16::<LittleEndian>(if i == 1 { 0x7FFF } else { 0 })
            .unwrap();
    }
    payload.write_i32::<LittleEndian>(1).unwrap();
    payload.write_i32::<LittleEndian>(520).unwrap();
    payload.write_i16::<LittleEndian>(0x200).unwrap();
    payload.write_i16::<LittleEndian>(0x1FF).unwrap();
    payload.write_u16::<LittleEndian>(4).unwrap();
    payload.write_u16::<LittleEndian>(1).unwrap();
    let header: u32 = 2;
    payload
        .write_u32::<LittleEndian>(header ^ ((0x200 << 22) | (0x200 << 12)))
        .unwrap();
    payload.push(1);
    payload.push(1);
    payload.write_u32::<LittleEndian>(0x7FFF_7FFF).unwrap();

    let mut idx = Vec::new();
    for id in 0..=110u32 {
        if id == 110 {
            idx.write_u32::<LittleEndian>(0).unwrap();
            idx.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
            idx.write_u32::<LittleEndian>(0).unwrap();
        } else {
            idx.write_u32::<LittleEndian>(INVALID).unwrap();
            idx.write_u32::<LittleEndian>(0).unwrap();
            idx.write_u32::<LittleEndian>(0).unwrap();
        }
    }
    write(dir, "anim.mul", payload);
    write(dir, "anim.idx", idx);

    // animdata.mul: id 1 cycles 4 frames.
    let mut animdata = Vec::new();
    for block in 0..1u32 {
        animdata.write_u32::<LittleEndian>(0).unwrap();
        for slot in 0..8u32 {
            let id = block * 8 + slot;
            let mut frames = [0u8; 64];
            let (count, interval) = if id == 1 {
                frames[..4].copy_from_slice(&[0, 1, 2, 3]);
                (4u8, 5u8)
            } else {
                (0, 0)
            };
            animdata.extend_from_slice(&frames);
            animdata.push(0);
            animdata.push(count);
            animdata.push(interval);
            animdata.push(0);
        }
    }
    write(dir, "animdata.mul", animdata);
}

fn build_fonts(dir: &Path) {
    let mut out = Vec::new();
    for font in 0..10u8 {
        out.push(font);
        for _ in 0..224 {
            out.push(4); // width
            out.push(6); // height
            out.push(0);
            for _ in 0..4 * 6 {
                out.write_u16::<LittleEndian>(0x7FFF).unwrap();
            }
        }
    }
    write(dir, "fonts.mul", out);

    let mut uni = vec![0u8; 0x10000 * 4];
    let offset = uni.len() as u32;
    uni.extend_from_slice(&[1u8, 0xFE, 8, 2]);
    uni.push(0xFF);
    uni.push(0x00);
    let slot = ('A' as usize) * 4;
    uni[slot..slot + 4].copy_from_slice(&offset.to_le_bytes());
    write(dir, "unifont.mul", uni);
}

/// Builds every fixture file into `dir`.
pub fn build_client_dir(dir: &Path) {
    build_art(dir);
    build_tiledata(dir);
    build_gumps(dir);
    build_map(dir);
    build_hues(dir);
    build_cliloc(dir);
    build_speech(dir);
    build_radarcol(dir);
    build_skills(dir);
    build_lights(dir);
    build_textures(dir);
    build_sounds(dir);
    build_multis(dir);
    build_anim(dir);
    build_fonts(dir);
}
