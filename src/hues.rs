//! The hues.mul codec: 3000 recoloring palettes in 708-byte blocks of
//! eight 88-byte entries each.

use byteorder::{LittleEndian, ReadBytesExt};
use getset::{CopyGetters, Getters};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::errors::{IoCtx, Result, UoError};
use crate::file::UoFile;
use crate::utils::color::Argb1555;
use crate::utils::name_ascii;

pub const HUE_MAX: u32 = 3000;

const ENTRIES_PER_BLOCK: u32 = 8;
const ENTRY_SIZE: u64 = 32 * 2 + 2 + 2 + 20; // 88
const BLOCK_SIZE: u64 = 4 + ENTRIES_PER_BLOCK as u64 * ENTRY_SIZE; // 708
const COLOR_QTY: usize = 32;

/// One hue: a 32-color gradient, the sub-range actually applied, and a
/// name. Colors are kept as stored (alpha bit clear); [`Hue::color`] sets
/// the alpha bit on the way out.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct Hue {
    #[getset(get_copy = "pub")]
    index: u32,
    colors: [u16; COLOR_QTY],
    #[getset(get_copy = "pub")]
    table_start: u16,
    #[getset(get_copy = "pub")]
    table_end: u16,
    #[getset(get = "pub")]
    name: String,
}

impl Hue {
    /// The raw stored color words, high bit clear.
    pub fn colors(&self) -> &[u16; COLOR_QTY] {
        &self.colors
    }

    /// Palette color `i`, alpha forced on.
    pub fn color(&self, i: usize) -> Argb1555 {
        Argb1555::from_value(self.colors[i & (COLOR_QTY - 1)]).opaque()
    }

    /// Recolors an image in place: every non-transparent pixel becomes the
    /// palette color indexed by its red channel. With `partial` set, only
    /// gray pixels (r == g == b) are replaced; the rest keep their color.
    pub fn apply_to(&self, image: &mut crate::utils::bitmap::Bitmap16, partial: bool) {
        let rect = image.rect();
        for y in rect.y0..rect.y1 {
            for x in rect.x0..rect.x1 {
                let pixel = image.at(x, y);
                if pixel.value() == 0 {
                    continue;
                }
                let (r, g, b) = (pixel.r(), pixel.g(), pixel.b());
                if !partial || (r == g && g == b) {
                    image.set(x, y, self.color(r as usize));
                }
            }
        }
    }

    fn decode(index: u32, bytes: &[u8], file: &str) -> Result<Self> {
        let mut rdr = Cursor::new(bytes);
        let mut colors = [0u16; COLOR_QTY];
        for color in colors.iter_mut() {
            *color = rdr.read_u16::<LittleEndian>().ctx(file, "hue color")?;
        }
        let table_start = rdr.read_u16::<LittleEndian>().ctx(file, "hue table start")?;
        let table_end = rdr.read_u16::<LittleEndian>().ctx(file, "hue table end")?;
        let mut name = [0u8; 20];
        rdr.read_exact(&mut name).ctx(file, "hue name")?;
        Ok(Self {
            index,
            colors,
            table_start,
            table_end,
            name: name_ascii(&name).to_owned(),
        })
    }
}

/// Reader over the single-entry hues file.
pub struct Hues {
    file: Arc<UoFile>,
}

impl Hues {
    pub(crate) fn new(file: Arc<UoFile>) -> Self {
        Self { file }
    }

    pub fn hue(&self, index: u32) -> Result<Hue> {
        if index >= HUE_MAX {
            return Err(UoError::out_of_range(
                "hue index",
                index as i64,
                0,
                HUE_MAX as i64,
            ));
        }
        let block = index / ENTRIES_PER_BLOCK;
        let slot = index % ENTRIES_PER_BLOCK;
        let offset = block as u64 * BLOCK_SIZE + 4 + slot as u64 * ENTRY_SIZE;
        let mut raw = [0u8; ENTRY_SIZE as usize];
        let read = self.file.read_at(0, &mut raw, offset)?;
        if read < raw.len() {
            return Err(UoError::truncated(
                self.file.name(),
                format!("hue entry {index}"),
            ));
        }
        Hue::decode(index, &raw, self.file.name())
    }

    pub fn iter(&self) -> impl Iterator<Item = Hue> + '_ {
        (0..HUE_MAX).filter_map(|index| self.hue(index).ok())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    /// 3000 hue slots; hue `i` stores colors `i.wrapping_mul(3) + j` with
    /// the high bit clear, and hue 1337 is named "royal".
    pub(crate) fn sample_hues() -> Vec<u8> {
        let mut out = Vec::new();
        for block in 0..(HUE_MAX / ENTRIES_PER_BLOCK) {
            out.write_u32::<LittleEndian>(0).unwrap();
            for slot in 0..ENTRIES_PER_BLOCK {
                let index = block * ENTRIES_PER_BLOCK + slot;
                for j in 0..COLOR_QTY as u32 {
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
        out
    }

    #[test]
    fn entry_geometry() {
        assert_eq!(ENTRY_SIZE, 88);
        assert_eq!(BLOCK_SIZE, 708);
        assert_eq!(sample_hues().len() as u64, 375 * BLOCK_SIZE);
    }

    #[test]
    fn apply_recolors_by_gray_level() {
        use crate::utils::bitmap::{Bitmap16, Rect};
        let hue = Hue {
            index: 1,
            colors: std::array::from_fn(|i| 0x7C00 | i as u16),
            table_start: 0,
            table_end: 31,
            name: String::new(),
        };
        let mut image = Bitmap16::new(Rect::sized(3, 1));
        image.set(0, 0, Argb1555::from_components(9, 9, 9, 1)); // gray
        image.set(1, 0, Argb1555::from_components(20, 3, 3, 1)); // colored
        // Pixel 2 stays transparent.
        hue.apply_to(&mut image, true);
        assert_eq!(image.at(0, 0).value(), 0x8000 | 0x7C00 | 9);
        assert_eq!(image.at(1, 0), Argb1555::from_components(20, 3, 3, 1));
        assert_eq!(image.at(2, 0).value(), 0);

        hue.apply_to(&mut image, false);
        assert_eq!(image.at(1, 0).value(), 0x8000 | 0x7C00 | 20);
    }

    #[test]
    fn decode_carries_the_name_slot() {
        let data = sample_hues();
        let offset = (1337 / 8) as usize * 708 + 4 + (1337 % 8) as usize * 88;
        let hue = Hue::decode(1337, &data[offset..offset + 88], "hues.mul").unwrap();
        assert_eq!(hue.name(), "royal");
        assert_eq!(hue.table_start(), 2);
        assert_eq!(hue.table_end(), 30);
        // Stored colors keep the high bit clear; retrieval sets it.
        assert!(hue.colors().iter().all(|&c| c <= 0x7FFF));
        assert!(hue.color(0).is_opaque());
    }
}
