//! The localized-string codec over Cliloc.* stream files.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::errors::{IoCtx, Result, UoError};
use crate::file::{StructuralDecoder, UoFile};

pub const DEFAULT_LANGUAGE: &str = "enu";

/// The structural decoder: a 6-byte file header, then repeated
/// `(id:i32, flag:u8, length:i16, utf-8 text)` records until EOF. A
/// negative length is fatal. Each stored payload is `id + flag + text` so
/// the entry is self-describing.
pub(crate) fn decoder() -> StructuralDecoder {
    Box::new(|data, name, add| {
        let mut rdr = Cursor::new(data);
        let _header = rdr.read_u32::<LittleEndian>().ctx(name, "cliloc header")?;
        let _header2 = rdr.read_u16::<LittleEndian>().ctx(name, "cliloc header")?;

        while (rdr.position() as usize) < data.len() {
            let id = rdr.read_i32::<LittleEndian>().ctx(name, "cliloc id")?;
            let flag = rdr.read_u8().ctx(name, "cliloc flag")?;
            let length = rdr.read_i16::<LittleEndian>().ctx(name, "cliloc length")?;
            if id < 0 || length < 0 {
                return Err(UoError::invalid(
                    name,
                    format!("negative cliloc record (id {id}, length {length})"),
                ));
            }
            let mut payload = Vec::with_capacity(5 + length as usize);
            payload.extend_from_slice(&(id as u32).to_le_bytes());
            payload.push(flag);
            let text_start = payload.len();
            payload.resize(text_start + length as usize, 0);
            rdr.read_exact(&mut payload[text_start..]).ctx(name, "cliloc text")?;
            add(id as u32, length as u64, payload);
        }
        Ok(())
    })
}

/// Localized-string reader for one language.
pub struct Cliloc {
    file: Arc<UoFile>,
    language: String,
}

impl Cliloc {
    pub(crate) fn new(file: Arc<UoFile>, language: String) -> Self {
        Self { file, language }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// The text behind a string id.
    pub fn string(&self, id: u32) -> Result<String> {
        self.file.decode(id, |bytes, _extra| {
            if bytes.len() < 5 {
                return Err(UoError::truncated(self.file.name(), format!("string {id}")));
            }
            Ok(String::from_utf8_lossy(&bytes[5..]).into_owned())
        })
    }

    /// The record flag byte (0 original, 1 custom, 2 modified).
    pub fn flag(&self, id: u32) -> Result<u8> {
        self.file.decode(id, |bytes, _extra| {
            bytes.get(4).copied().ok_or_else(|| {
                UoError::truncated(self.file.name(), format!("string {id}"))
            })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, String)> + '_ {
        self.file
            .ids()
            .filter_map(|id| self.string(id).ok().map(|text| (id, text)))
    }
}
