//! The texmaps codec: square land textures drawn on sloped terrain, raw
//! 16-bit pixels with the size class in the index extra word.

use getset::{CopyGetters, Getters};
use std::sync::Arc;

use crate::errors::{Result, UoError};
use crate::file::UoFile;
use crate::utils::bitmap::Bitmap16;

pub const TEXTURE_MAX: u32 = 0x4000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LandTextureSize {
    #[default]
    Small, // 64x64
    Big, // 128x128
}

impl LandTextureSize {
    pub fn dimension(self) -> u32 {
        match self {
            LandTextureSize::Small => 64,
            LandTextureSize::Big => 128,
        }
    }

    /// The index extra word stores the size class: 1 means 128x128.
    fn from_extra(extra: u64) -> Self {
        if extra == 1 {
            LandTextureSize::Big
        } else {
            LandTextureSize::Small
        }
    }
}

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct LandTexture {
    #[getset(get_copy = "pub")]
    id: u32,
    #[getset(get_copy = "pub")]
    size: LandTextureSize,
    #[getset(get = "pub")]
    image: Bitmap16,
}

/// Reader over the indexed texture file.
pub struct LandTextures {
    file: Arc<UoFile>,
}

impl LandTextures {
    pub(crate) fn new(file: Arc<UoFile>) -> Self {
        Self { file }
    }

    pub fn texture(&self, id: u32) -> Result<LandTexture> {
        if id >= TEXTURE_MAX {
            return Err(UoError::out_of_range(
                "texture id",
                id as i64,
                0,
                TEXTURE_MAX as i64,
            ));
        }
        self.file.decode(id, |bytes, extra| {
            let size = LandTextureSize::from_extra(extra);
            let dimension = size.dimension();
            let pixel_qty = (dimension * dimension) as usize;
            if bytes.len() < pixel_qty * 2 {
                return Err(UoError::truncated(
                    self.file.name(),
                    format!("texture {id} needs {} bytes", pixel_qty * 2),
                ));
            }
            let pixels: Vec<u16> = bytes[..pixel_qty * 2]
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            let image = Bitmap16::from_pixels(dimension, dimension, &pixels)
                .expect("pixel count matches dimensions");
            Ok(LandTexture { id, size, image })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = LandTexture> + '_ {
        self.file.ids().filter_map(|id| self.texture(id).ok())
    }
}
