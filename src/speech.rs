//! The speech.mul codec: the only big-endian format in the client, a
//! stream of keyword records keyed by stream position.

use byteorder::{BigEndian, ReadBytesExt};
use getset::{CopyGetters, Getters};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::errors::{IoCtx, Result, UoError};
use crate::file::{StructuralDecoder, UoFile};

const TEXT_MAX: i16 = 128;

/// The structural decoder: repeated `(id:i16 BE, length:i16 BE, text)`
/// until EOF; entries are keyed by their position in the stream.
pub(crate) fn decoder() -> StructuralDecoder {
    Box::new(|data, name, add| {
        let mut rdr = Cursor::new(data);
        let mut position: u32 = 0;
        while (rdr.position() as usize) < data.len() {
            let id = rdr.read_i16::<BigEndian>().ctx(name, "speech id")?;
            let length = rdr.read_i16::<BigEndian>().ctx(name, "speech length")?;
            if !(0..=TEXT_MAX).contains(&length) {
                return Err(UoError::invalid(
                    name,
                    format!("speech record {position} claims {length} text bytes"),
                ));
            }
            let mut payload = Vec::with_capacity(2 + length as usize);
            payload.extend_from_slice(&id.to_be_bytes());
            let text_start = payload.len();
            payload.resize(text_start + length as usize, 0);
            rdr.read_exact(&mut payload[text_start..]).ctx(name, "speech text")?;
            add(position, id as u16 as u64, payload);
            position += 1;
        }
        Ok(())
    })
}

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct SpeechEntry {
    #[getset(get_copy = "pub")]
    id: u16,
    #[getset(get = "pub")]
    text: String,
}

/// Reader over the decoded speech stream.
pub struct Speech {
    file: Arc<UoFile>,
}

impl Speech {
    pub(crate) fn new(file: Arc<UoFile>) -> Self {
        Self { file }
    }

    pub fn entry(&self, position: u32) -> Result<SpeechEntry> {
        self.file.decode(position, |bytes, _extra| {
            if bytes.len() < 2 {
                return Err(UoError::truncated(
                    self.file.name(),
                    format!("speech entry {position}"),
                ));
            }
            Ok(SpeechEntry {
                id: u16::from_be_bytes([bytes[0], bytes[1]]),
                text: String::from_utf8_lossy(&bytes[2..]).into_owned(),
            })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = SpeechEntry> + '_ {
        self.file.ids().filter_map(|pos| self.entry(pos).ok())
    }
}
