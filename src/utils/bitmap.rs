use derive_new::new;
use image::RgbaImage;
use wide::u16x16;

use super::color::Argb1555;

/// A rectangle defined by two opposite corners, half-open on the max side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, new)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width as i32,
            y1: height as i32,
        }
    }

    pub fn width(&self) -> u32 {
        (self.x1 - self.x0).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y1 - self.y0).max(0) as u32
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    pub fn intersect(&self, other: Rect) -> Rect {
        Rect {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }
}

/// A 16-bit ARGB1555 raster. Pixels are stored as two little-endian bytes
/// each; a stored value of zero is transparent. Reads outside the bounds
/// answer the transparent pixel and writes outside the bounds are dropped.
#[derive(Clone, Debug)]
pub struct Bitmap16 {
    rect: Rect,
    stride: usize, // pixels per storage row
    pix: Vec<u8>,
}

impl Bitmap16 {
    pub fn new(rect: Rect) -> Self {
        let stride = rect.width() as usize;
        Self {
            rect,
            stride,
            pix: vec![0u8; stride * rect.height() as usize * 2],
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: &[u16]) -> Option<Self> {
        if pixels.len() != (width * height) as usize {
            return None;
        }
        let mut pix = Vec::with_capacity(pixels.len() * 2);
        for p in pixels {
            pix.extend_from_slice(&p.to_le_bytes());
        }
        Some(Self {
            rect: Rect::sized(width, height),
            stride: width as usize,
            pix,
        })
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn width(&self) -> u32 {
        self.rect.width()
    }

    pub fn height(&self) -> u32 {
        self.rect.height()
    }

    #[inline]
    fn pix_offset(&self, x: i32, y: i32) -> usize {
        (((y - self.rect.y0) as usize) * self.stride + (x - self.rect.x0) as usize) * 2
    }

    pub fn at(&self, x: i32, y: i32) -> Argb1555 {
        if !self.rect.contains(x, y) {
            return Argb1555::TRANSPARENT;
        }
        let o = self.pix_offset(x, y);
        Argb1555::from_value(u16::from_le_bytes([self.pix[o], self.pix[o + 1]]))
    }

    pub fn set(&mut self, x: i32, y: i32, color: Argb1555) {
        if !self.rect.contains(x, y) {
            return;
        }
        let o = self.pix_offset(x, y);
        self.pix[o..o + 2].copy_from_slice(&color.value().to_le_bytes());
    }

    /// True iff the alpha bit is set on every pixel inside the bounds.
    pub fn opaque(&self) -> bool {
        for y in self.rect.y0..self.rect.y1 {
            let row = self.pix_offset(self.rect.x0, y);
            let pixels: &[u16] =
                bytemuck::cast_slice(&self.pix[row..row + self.rect.width() as usize * 2]);
            if pixels.iter().any(|p| u16::from_le(*p) & 0x8000 == 0) {
                return false;
            }
        }
        true
    }

    /// Borrows a sub-rectangle; the view shares pixel storage and keeps its
    /// own rectangle and stride.
    pub fn view(&self, rect: Rect) -> BitmapView<'_> {
        let rect = self.rect.intersect(rect);
        let start = if rect.is_empty() {
            0
        } else {
            self.pix_offset(rect.x0, rect.y0)
        };
        BitmapView {
            rect,
            stride: self.stride,
            pix: &self.pix[start..],
        }
    }

    /// Converts into the shared 8-bit-per-channel model. Zero pixels come
    /// out fully transparent, everything else opaque.
    pub fn to_image(&self) -> RgbaImage {
        let width = self.rect.width();
        let height = self.rect.height();
        let mut rgba: Vec<u8> = Vec::with_capacity(width as usize * height as usize * 4);

        let pixels: &[u16] = bytemuck::cast_slice(&self.pix);
        let (chunks, tail) = pixels.as_chunks::<16>();

        for &chunk_array in chunks {
            #[allow(unused_mut)]
            let mut chunk = u16x16::new(chunk_array);
            #[cfg(target_endian = "big")]
            {
                chunk = chunk.swap_bytes();
            }

            let b_u16: u16x16 = chunk & u16x16::splat(0x1F);
            let g_u16: u16x16 = (chunk >> 5) & u16x16::splat(0x1F);
            let r_u16: u16x16 = (chunk >> 10) & u16x16::splat(0x1F);

            let mut rgba_u32_array = [0u32; 16];
            for i in 0..16 {
                let r = (r_u16.as_array_ref()[i] as u32 * 255) / 31;
                let g = (g_u16.as_array_ref()[i] as u32 * 255) / 31;
                let b = (b_u16.as_array_ref()[i] as u32 * 255) / 31;
                // A zero pixel is the transparent one.
                let a = if chunk.as_array_ref()[i] == 0 { 0 } else { 255 };
                rgba_u32_array[i] = (a << 24) | (b << 16) | (g << 8) | r;
            }
            rgba.extend_from_slice(bytemuck::cast_slice(&rgba_u32_array));
        }

        for &pixel in tail {
            let value = u16::from_le(pixel);
            rgba.extend_from_slice(
                &Argb1555::from_value(value).as_rgba8888().value().to_le_bytes(),
            );
        }

        RgbaImage::from_raw(width, height, rgba)
            .expect("pixel buffer length matches its dimensions")
    }
}

/// A borrowed window into a [`Bitmap16`]. Coordinates stay absolute: the
/// view answers for the same (x, y) positions as its parent.
#[derive(Clone, Copy, Debug)]
pub struct BitmapView<'a> {
    rect: Rect,
    stride: usize,
    pix: &'a [u8],
}

impl BitmapView<'_> {
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn at(&self, x: i32, y: i32) -> Argb1555 {
        if !self.rect.contains(x, y) {
            return Argb1555::TRANSPARENT;
        }
        let o = (((y - self.rect.y0) as usize) * self.stride + (x - self.rect.x0) as usize) * 2;
        Argb1555::from_value(u16::from_le_bytes([self.pix[o], self.pix[o + 1]]))
    }

    pub fn opaque(&self) -> bool {
        for y in self.rect.y0..self.rect.y1 {
            for x in self.rect.x0..self.rect.x1 {
                if !self.at(x, y).is_opaque() {
                    return false;
                }
            }
        }
        true
    }
}
