//! The light.mul codec: signed intensity rasters with dimensions packed
//! in the index extra word.

use getset::{CopyGetters, Getters};
use std::sync::Arc;

use crate::errors::{Result, UoError};
use crate::file::UoFile;
use crate::utils::bitmap::{Bitmap16, Rect};
use crate::utils::color::Argb1555;

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct Light {
    #[getset(get_copy = "pub")]
    id: u32,
    #[getset(get_copy = "pub")]
    width: u32,
    #[getset(get_copy = "pub")]
    height: u32,
    data: Vec<i8>,
}

impl Light {
    /// Signed per-pixel intensities, row-major.
    pub fn data(&self) -> &[i8] {
        &self.data
    }

    pub fn intensity(&self, x: u32, y: u32) -> i8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[(y * self.width + x) as usize]
    }

    /// Grayscale rendition: intensity clamped to the 5-bit channel range,
    /// opaque everywhere.
    pub fn image(&self) -> Bitmap16 {
        let mut image = Bitmap16::new(Rect::sized(self.width, self.height));
        for y in 0..self.height {
            for x in 0..self.width {
                let level = self.intensity(x, y).clamp(0, 31) as u8;
                image.set(
                    x as i32,
                    y as i32,
                    Argb1555::from_components(level, level, level, 1),
                );
            }
        }
        image
    }
}

/// Reader over the indexed light rasters.
pub struct Lights {
    file: Arc<UoFile>,
}

impl Lights {
    pub(crate) fn new(file: Arc<UoFile>) -> Self {
        Self { file }
    }

    pub fn light(&self, id: u32) -> Result<Light> {
        self.file.decode(id, |bytes, extra| {
            let width = (extra & 0xFFFF) as u32;
            let height = ((extra >> 16) & 0xFFFF) as u32;
            if width == 0 || height == 0 || width > 1024 || height > 1024 {
                return Err(UoError::invalid(
                    self.file.name(),
                    format!("implausible light dimensions {width}x{height}"),
                ));
            }
            if bytes.len() < (width * height) as usize {
                return Err(UoError::truncated(self.file.name(), format!("light {id}")));
            }
            Ok(Light {
                id,
                width,
                height,
                data: bytes[..(width * height) as usize]
                    .iter()
                    .map(|&b| b as i8)
                    .collect(),
            })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Light> + '_ {
        self.file.ids().filter_map(|id| self.light(id).ok())
    }
}
