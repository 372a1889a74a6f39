//! The font codecs: the ten packed ASCII fonts of fonts.mul and the
//! bit-packed unicode fonts of unifont*.mul.

use getset::CopyGetters;
use std::sync::Arc;

use crate::errors::{Result, UoError};
use crate::file::UoFile;
use crate::utils::bitmap::{Bitmap16, Rect};
use crate::utils::color::{ALPHA_BIT, Argb1555};

pub const ASCII_FONT_QTY: usize = 10;
const ASCII_GLYPH_QTY: usize = 224; // characters 0x20..0xFF
const ASCII_FIRST_CHAR: u8 = 0x20;

#[derive(Clone, Debug, CopyGetters)]
pub struct AsciiGlyph {
    #[getset(get_copy = "pub")]
    width: u8,
    #[getset(get_copy = "pub")]
    height: u8,
    image: Bitmap16,
}

impl AsciiGlyph {
    pub fn image(&self) -> &Bitmap16 {
        &self.image
    }
}

#[derive(Clone, Debug)]
pub struct AsciiFont {
    header: u8,
    glyphs: Vec<AsciiGlyph>,
}

impl AsciiFont {
    pub fn header(&self) -> u8 {
        self.header
    }

    /// The glyph for a character; characters below 0x20 have none.
    pub fn glyph(&self, ch: u8) -> Option<&AsciiGlyph> {
        if ch < ASCII_FIRST_CHAR {
            return None;
        }
        self.glyphs.get((ch - ASCII_FIRST_CHAR) as usize)
    }

    pub fn line_height(&self) -> u8 {
        self.glyphs.iter().map(|g| g.height).max().unwrap_or(0)
    }
}

/// Parses the whole fonts.mul blob: per font a header byte, then 224
/// glyphs of `(width, height, unused, width*height u16 pixels)`. Non-zero
/// pixels get the alpha bit forced on.
pub(crate) fn load_ascii(file: &UoFile) -> Result<Vec<AsciiFont>> {
    let bytes = file.read_full(0)?;
    let name = file.name();
    let mut pos = 0usize;
    let take = |pos: &mut usize, n: usize| -> Result<std::ops::Range<usize>> {
        let start = *pos;
        let end = start
            .checked_add(n)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| UoError::truncated(name, format!("font data at {start}")))?;
        *pos = end;
        Ok(start..end)
    };

    let mut fonts = Vec::with_capacity(ASCII_FONT_QTY);
    for _ in 0..ASCII_FONT_QTY {
        let header = bytes[take(&mut pos, 1)?][0];
        let mut glyphs = Vec::with_capacity(ASCII_GLYPH_QTY);
        for _ in 0..ASCII_GLYPH_QTY {
            let meta = &bytes[take(&mut pos, 3)?];
            let (width, height) = (meta[0], meta[1]);
            let raw = &bytes[take(&mut pos, width as usize * height as usize * 2)?];
            let mut image = Bitmap16::new(Rect::sized(width as u32, height as u32));
            for y in 0..height as i32 {
                for x in 0..width as i32 {
                    let i = (y as usize * width as usize + x as usize) * 2;
                    let value = u16::from_le_bytes([raw[i], raw[i + 1]]);
                    if value != 0 {
                        image.set(x, y, Argb1555::from_value(value).opaque());
                    }
                }
            }
            glyphs.push(AsciiGlyph {
                width,
                height,
                image,
            });
        }
        fonts.push(AsciiFont { header, glyphs });
    }
    Ok(fonts)
}

#[derive(Clone, Debug, CopyGetters)]
pub struct UnicodeGlyph {
    #[getset(get_copy = "pub")]
    x_offset: i8,
    #[getset(get_copy = "pub")]
    y_offset: i8,
    image: Bitmap16,
}

impl UnicodeGlyph {
    pub fn image(&self) -> &Bitmap16 {
        &self.image
    }
}

/// One unifont file: a u32 offset per code point, then bit-packed glyph
/// rows of `ceil(width/8)` bytes.
pub struct UnicodeFont {
    file: Arc<UoFile>,
}

impl UnicodeFont {
    pub(crate) fn new(file: Arc<UoFile>) -> Self {
        Self { file }
    }

    pub fn glyph(&self, ch: char) -> Result<UnicodeGlyph> {
        let code = ch as u32;
        if code >= 0x10000 {
            return Err(UoError::out_of_range("unicode code point", code as i64, 0, 0x10000));
        }
        let mut raw = [0u8; 4];
        if self.file.read_at(0, &mut raw, code as u64 * 4)? < 4 {
            return Err(UoError::truncated(self.file.name(), "unifont offset table"));
        }
        let offset = u32::from_le_bytes(raw);
        if offset == 0 {
            return Err(UoError::not_found(self.file.name(), code));
        }

        let mut header = [0u8; 4];
        if self.file.read_at(0, &mut header, offset as u64)? < 4 {
            return Err(UoError::truncated(
                self.file.name(),
                format!("unifont glyph {code:#x}"),
            ));
        }
        let (x_offset, y_offset) = (header[0] as i8, header[1] as i8);
        let (width, height) = (header[2] as u32, header[3] as u32);

        let row_bytes = width.div_ceil(8) as usize;
        let mut rows = vec![0u8; row_bytes * height as usize];
        if self.file.read_at(0, &mut rows, offset as u64 + 4)? < rows.len() {
            return Err(UoError::truncated(
                self.file.name(),
                format!("unifont glyph {code:#x}"),
            ));
        }

        let mut image = Bitmap16::new(Rect::sized(width, height));
        for y in 0..height {
            let scanline = &rows[y as usize * row_bytes..][..row_bytes];
            for x in 0..width {
                if scanline[(x / 8) as usize] & (1 << (7 - (x % 8))) != 0 {
                    image.set(x as i32, y as i32, Argb1555::from_value(ALPHA_BIT));
                }
            }
        }
        Ok(UnicodeGlyph {
            x_offset,
            y_offset,
            image,
        })
    }
}
