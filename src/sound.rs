//! The sound codec: a 32-byte name header followed by raw PCM samples,
//! with optional WAV framing at the client's fixed 22 050 Hz mono 16-bit
//! format.

use getset::{CopyGetters, Getters};
use std::sync::Arc;

use crate::errors::{Result, UoError};
use crate::file::UoFile;
use crate::utils::name_ascii;

const NAME_HEADER: usize = 32;

const SAMPLE_RATE: u32 = 22_050;
const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct Sound {
    #[getset(get_copy = "pub")]
    id: u32,
    #[getset(get = "pub")]
    name: String,
    pcm: Vec<u8>,
}

impl Sound {
    /// Raw PCM sample bytes, little-endian i16 mono.
    pub fn pcm(&self) -> &[u8] {
        &self.pcm
    }

    /// The samples wrapped in a canonical 44-byte PCM WAV header.
    pub fn wav(&self) -> Vec<u8> {
        let data_len = self.pcm.len() as u32;
        let byte_rate = SAMPLE_RATE * CHANNELS as u32 * BITS_PER_SAMPLE as u32 / 8;
        let block_align = CHANNELS * BITS_PER_SAMPLE / 8;

        let mut out = Vec::with_capacity(44 + self.pcm.len());
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&CHANNELS.to_le_bytes());
        out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        out.extend_from_slice(&self.pcm);
        out
    }
}

/// Reader over the indexed sound entries.
pub struct Sounds {
    file: Arc<UoFile>,
}

impl Sounds {
    pub(crate) fn new(file: Arc<UoFile>) -> Self {
        Self { file }
    }

    pub fn sound(&self, id: u32) -> Result<Sound> {
        self.file.decode(id, |bytes, _extra| {
            if bytes.len() < NAME_HEADER {
                return Err(UoError::truncated(self.file.name(), format!("sound {id}")));
            }
            Ok(Sound {
                id,
                name: name_ascii(&bytes[..NAME_HEADER]).to_owned(),
                pcm: bytes[NAME_HEADER..].to_vec(),
            })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Sound> + '_ {
        self.file.ids().filter_map(|id| self.sound(id).ok())
    }
}
