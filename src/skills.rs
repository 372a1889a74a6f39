//! The skills codecs: the indexed skill list (16-byte index stride) and
//! the skillgrp.mul grouping table.

use byteorder::{LittleEndian, ReadBytesExt};
use getset::{CopyGetters, Getters};
use std::io::Cursor;
use std::sync::Arc;

use crate::errors::{IoCtx, Result, UoError};
use crate::file::UoFile;
use crate::utils::name_ascii;

#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct Skill {
    #[getset(get_copy = "pub")]
    id: u32,
    /// Whether using the skill is a deliberate action (the button in the
    /// client's skill list).
    #[getset(get_copy = "pub")]
    is_action: bool,
    #[getset(get = "pub")]
    name: String,
}

/// Reader over the indexed skill list.
pub struct Skills {
    file: Arc<UoFile>,
}

impl Skills {
    pub(crate) fn new(file: Arc<UoFile>) -> Self {
        Self { file }
    }

    pub fn skill(&self, id: u32) -> Result<Skill> {
        self.file.decode(id, |bytes, _extra| {
            if bytes.is_empty() {
                return Err(UoError::truncated(self.file.name(), format!("skill {id}")));
            }
            Ok(Skill {
                id,
                is_action: bytes[0] != 0,
                name: name_ascii(&bytes[1..]).to_owned(),
            })
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Skill> + '_ {
        self.file.ids().filter_map(|id| self.skill(id).ok())
    }
}

/// The skillgrp.mul table: group names plus one group assignment per
/// skill id. Group 0 is always "Misc".
#[derive(Clone, Debug, Getters)]
pub struct SkillGroups {
    #[getset(get = "pub")]
    names: Vec<String>,
    #[getset(get = "pub")]
    assignments: Vec<u32>,
}

impl SkillGroups {
    const ASCII_SLOT: usize = 17;

    pub(crate) fn load(file: &UoFile) -> Result<Self> {
        let bytes = file.read_full(0)?;
        let name = file.name();
        let mut rdr = Cursor::new(&bytes[..]);

        let first = rdr.read_i32::<LittleEndian>().ctx(name, "skill group count")?;
        let (unicode, count) = if first == -1 {
            (
                true,
                rdr.read_i32::<LittleEndian>().ctx(name, "skill group count")?,
            )
        } else {
            (false, first)
        };
        if count < 1 || count > 1024 {
            return Err(UoError::invalid(
                name,
                format!("implausible skill group count {count}"),
            ));
        }

        let mut names = Vec::with_capacity(count as usize);
        names.push("Misc".to_owned());
        for _ in 1..count {
            if unicode {
                // 17 UTF-16 code units per slot.
                let mut units = [0u16; Self::ASCII_SLOT];
                for unit in units.iter_mut() {
                    *unit = rdr.read_u16::<LittleEndian>().ctx(name, "group name")?;
                }
                let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
                names.push(String::from_utf16_lossy(&units[..end]));
            } else {
                let mut raw = [0u8; Self::ASCII_SLOT];
                std::io::Read::read_exact(&mut rdr, &mut raw).ctx(name, "group name")?;
                names.push(name_ascii(&raw).to_owned());
            }
        }

        let mut assignments = Vec::new();
        while (rdr.position() as usize) + 4 <= bytes.len() {
            let group = rdr.read_i32::<LittleEndian>().ctx(name, "group assignment")?;
            assignments.push(group.max(0) as u32);
        }

        Ok(Self { names, assignments })
    }

    /// The group a skill id belongs to.
    pub fn group_of(&self, skill_id: u32) -> Option<&str> {
        let group = *self.assignments.get(skill_id as usize)?;
        self.names.get(group as usize).map(String::as_str)
    }
}
