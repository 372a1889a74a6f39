//! The SDK facade: one [`UoFiles`] per client directory, lazily opening
//! and caching a handle per data file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use crate::anim::{Animation, Animations};
use crate::animdata::Animdata;
use crate::art::{Art, ArtTile};
use crate::cliloc::{Cliloc, DEFAULT_LANGUAGE};
use crate::errors::{Result, UoError};
use crate::file::{FileSpec, UoFile};
use crate::fonts::{self, AsciiFont, UnicodeFont};
use crate::geo::land_texture::LandTextures;
use crate::geo::map::TileMap;
use crate::gumps::{Gump, Gumps};
use crate::hues::{Hue, Hues};
use crate::light::Lights;
use crate::multis::Multis;
use crate::radarcol::RadarColors;
use crate::skills::{SkillGroups, Skills};
use crate::sound::Sounds;
use crate::speech::Speech;
use crate::tiledata::{self, LandTileInfo, StaticTileInfo, TileData};
use crate::utils::bitmap::Bitmap16;
use crate::{cliloc, speech};

/// Read-only access to an Ultima Online client directory. Any number of
/// threads may read concurrently; file handles and decoded entries are
/// cached per instance and released by [`UoFiles::close`] (or drop).
pub struct UoFiles {
    dir: PathBuf,
    closed: AtomicBool,
    files: RwLock<HashMap<String, Arc<UoFile>>>,
    maps: RwLock<HashMap<u32, Arc<TileMap>>>,
    tiledata: OnceLock<Arc<TileData>>,
    animdata: OnceLock<Arc<Animdata>>,
    skill_groups: OnceLock<Arc<SkillGroups>>,
    ascii_fonts: OnceLock<Arc<Vec<AsciiFont>>>,
}

impl UoFiles {
    /// Opens a client directory. Individual files are opened lazily on
    /// first use.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(UoError::io(
                &dir.to_string_lossy(),
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "client directory does not exist",
                ),
            ));
        }
        tracing::debug!(dir = %dir.display(), "opened client directory");
        Ok(Self {
            dir,
            closed: AtomicBool::new(false),
            files: RwLock::new(HashMap::new()),
            maps: RwLock::new(HashMap::new()),
            tiledata: OnceLock::new(),
            animdata: OnceLock::new(),
            skill_groups: OnceLock::new(),
            ascii_fonts: OnceLock::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Releases every cached handle. Idempotent; late errors are logged,
    /// never raised.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.files.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.maps.write().unwrap_or_else(|e| e.into_inner()).clear();
        tracing::debug!(dir = %self.dir.display(), "closed client directory");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(UoError::Closed);
        }
        Ok(())
    }

    /// The handle cache: keyed by the family's canonical (first candidate)
    /// filename; opening the same file twice answers the same handle.
    fn file(&self, key: &str, make: impl FnOnce() -> FileSpec) -> Result<Arc<UoFile>> {
        self.ensure_open()?;
        if let Some(found) = self.files.read().unwrap().get(key) {
            return Ok(found.clone());
        }
        let opened = Arc::new(UoFile::open(&self.dir, make())?);
        let mut cache = self.files.write().unwrap();
        Ok(cache.entry(key.to_owned()).or_insert(opened).clone())
    }

    /* File specs, one per asset family. */

    fn art_file(&self) -> Result<Arc<UoFile>> {
        self.file("artLegacyMUL.uop", || FileSpec {
            capacity: 0x14000,
            stem: Some("artlegacymul".into()),
            ..FileSpec::new(&["artLegacyMUL.uop", "art.mul", "artidx.mul"])
        })
    }

    fn gump_file(&self) -> Result<Arc<UoFile>> {
        self.file("gumpartLegacyMUL.uop", || FileSpec {
            capacity: crate::gumps::GUMP_MAX,
            stem: Some("gumpartlegacymul".into()),
            extra_prefix: true,
            ..FileSpec::new(&["gumpartLegacyMUL.uop", "gumpart.mul", "gumpidx.mul"])
        })
    }

    fn tiledata_file(&self) -> Result<Arc<UoFile>> {
        self.file("tiledata.mul", || FileSpec {
            decoder: Some(tiledata::decoder()),
            ..FileSpec::new(&["tiledata.mul"])
        })
    }

    fn anim_file(&self) -> Result<Arc<UoFile>> {
        self.file("anim.mul", || FileSpec {
            capacity: 0x40000,
            ..FileSpec::new(&["anim.mul", "anim.idx"])
        })
    }

    fn animdata_file(&self) -> Result<Arc<UoFile>> {
        self.file("animdata.mul", || FileSpec::new(&["animdata.mul"]))
    }

    fn map_blob_file(&self, index: u32) -> Result<Arc<UoFile>> {
        let uop = format!("map{index}LegacyMUL.uop");
        let mul = format!("map{index}.mul");
        let stem = format!("map{index}legacymul");
        self.file(&uop.clone(), move || FileSpec {
            chunk: crate::geo::map::BLOCK_PACKED_SIZE,
            capacity: 512,
            stem: Some(stem),
            ..FileSpec::new(&[uop, mul])
        })
    }

    fn statics_file(&self, index: u32) -> Result<Arc<UoFile>> {
        let data = format!("statics{index}.mul");
        let idx = format!("staidx{index}.mul");
        self.file(&data.clone(), move || FileSpec::new(&[data, idx]))
    }

    fn hues_file(&self) -> Result<Arc<UoFile>> {
        self.file("hues.mul", || FileSpec::new(&["hues.mul"]))
    }

    fn radarcol_file(&self) -> Result<Arc<UoFile>> {
        self.file("radarcol.mul", || FileSpec::new(&["radarcol.mul"]))
    }

    fn cliloc_file(&self, lang: &str) -> Result<Arc<UoFile>> {
        let upper = format!("Cliloc.{lang}");
        let lower = format!("cliloc.{lang}");
        self.file(&upper.clone(), move || FileSpec {
            decoder: Some(cliloc::decoder()),
            ..FileSpec::new(&[upper, lower])
        })
    }

    fn speech_file(&self) -> Result<Arc<UoFile>> {
        self.file("speech.mul", || FileSpec {
            decoder: Some(speech::decoder()),
            ..FileSpec::new(&["speech.mul"])
        })
    }

    fn skills_file(&self) -> Result<Arc<UoFile>> {
        self.file("skills.mul", || FileSpec {
            stride: 16,
            ..FileSpec::new(&["skills.mul", "skills.idx"])
        })
    }

    fn skillgrp_file(&self) -> Result<Arc<UoFile>> {
        self.file("skillgrp.mul", || FileSpec::new(&["skillgrp.mul"]))
    }

    fn light_file(&self) -> Result<Arc<UoFile>> {
        self.file("light.mul", || FileSpec::new(&["light.mul", "lightidx.mul"]))
    }

    fn texture_file(&self) -> Result<Arc<UoFile>> {
        self.file("texmaps.mul", || FileSpec {
            capacity: crate::geo::land_texture::TEXTURE_MAX,
            ..FileSpec::new(&["texmaps.mul", "texidx.mul"])
        })
    }

    fn sound_file(&self) -> Result<Arc<UoFile>> {
        self.file("soundLegacyMUL.uop", || FileSpec {
            stem: Some("soundlegacymul".into()),
            ..FileSpec::new(&["soundLegacyMUL.uop", "sound.mul", "soundidx.mul"])
        })
    }

    fn multi_file(&self) -> Result<Arc<UoFile>> {
        self.file("MultiCollection.uop", || FileSpec {
            capacity: crate::multis::MULTI_MAX,
            stem: Some("multicollection".into()),
            digits: 6,
            ..FileSpec::new(&["MultiCollection.uop", "multi.mul", "multi.idx"])
        })
    }

    fn fonts_file(&self) -> Result<Arc<UoFile>> {
        self.file("fonts.mul", || FileSpec::new(&["fonts.mul"]))
    }

    fn unifont_file(&self, index: u32) -> Result<Arc<UoFile>> {
        let name = if index == 0 {
            "unifont.mul".to_owned()
        } else {
            format!("unifont{index}.mul")
        };
        self.file(&name.clone(), move || FileSpec::new(&[name]))
    }

    /* Asset accessors. */

    /// The decoded tiledata table, loaded once per instance.
    pub fn tiledata(&self) -> Result<Arc<TileData>> {
        if let Some(found) = self.tiledata.get() {
            return Ok(found.clone());
        }
        let table = Arc::new(TileData::new(self.tiledata_file()?));
        Ok(self.tiledata.get_or_init(|| table).clone())
    }

    pub fn land_tile_info(&self, id: u32) -> Result<LandTileInfo> {
        self.tiledata()?.land_info(id)
    }

    pub fn static_tile_info(&self, id: u32) -> Result<StaticTileInfo> {
        self.tiledata()?.static_info(id)
    }

    /// The art reader (land + static tiles with tiledata annotations).
    pub fn art(&self) -> Result<Art> {
        Ok(Art::new(self.art_file()?, self.tiledata()?))
    }

    pub fn land_art(&self, id: u32) -> Result<ArtTile> {
        self.art()?.land(id)
    }

    pub fn static_art(&self, id: u32) -> Result<ArtTile> {
        self.art()?.static_item(id)
    }

    pub fn gumps(&self) -> Result<Gumps> {
        Ok(Gumps::new(self.gump_file()?))
    }

    pub fn gump(&self, id: u32) -> Result<Gump> {
        self.gumps()?.gump(id)
    }

    /// The animdata table, loaded once per instance. The file is optional
    /// in stripped-down client directories.
    fn animdata(&self) -> Result<Arc<Animdata>> {
        if let Some(found) = self.animdata.get() {
            return Ok(found.clone());
        }
        let table = Arc::new(Animdata::load(&*self.animdata_file()?)?);
        Ok(self.animdata.get_or_init(|| table).clone())
    }

    pub fn animations(&self) -> Result<Animations> {
        Ok(Animations::new(self.anim_file()?, self.animdata().ok()))
    }

    pub fn animation(&self, body: u32, action: u32, direction: u32) -> Result<Animation> {
        self.animations()?.animation(body, action, direction)
    }

    pub fn hues(&self) -> Result<Hues> {
        Ok(Hues::new(self.hues_file()?))
    }

    pub fn hue(&self, index: u32) -> Result<Hue> {
        self.hues()?.hue(index)
    }

    pub fn radar_colors(&self) -> Result<RadarColors> {
        Ok(RadarColors::new(self.radarcol_file()?))
    }

    /// The tile map of a plane, cached per map index.
    pub fn tile_map(&self, index: u32) -> Result<Arc<TileMap>> {
        self.ensure_open()?;
        if let Some(found) = self.maps.read().unwrap().get(&index) {
            return Ok(found.clone());
        }
        let map = Arc::new(TileMap::new(
            index,
            self.map_blob_file(index)?,
            self.statics_file(index)?,
            self.tiledata()?,
            Arc::new(RadarColors::new(self.radarcol_file()?)),
        )?);
        let mut cache = self.maps.write().unwrap();
        Ok(cache.entry(index).or_insert(map).clone())
    }

    /// Localized strings in the default "enu" language.
    pub fn cliloc(&self) -> Result<Cliloc> {
        self.cliloc_with_lang(DEFAULT_LANGUAGE)
    }

    pub fn cliloc_with_lang(&self, lang: &str) -> Result<Cliloc> {
        Ok(Cliloc::new(self.cliloc_file(lang)?, lang.to_owned()))
    }

    pub fn speech(&self) -> Result<Speech> {
        Ok(Speech::new(self.speech_file()?))
    }

    pub fn skills(&self) -> Result<Skills> {
        Ok(Skills::new(self.skills_file()?))
    }

    pub fn skill_groups(&self) -> Result<Arc<SkillGroups>> {
        if let Some(found) = self.skill_groups.get() {
            return Ok(found.clone());
        }
        let groups = Arc::new(SkillGroups::load(&*self.skillgrp_file()?)?);
        Ok(self.skill_groups.get_or_init(|| groups).clone())
    }

    pub fn lights(&self) -> Result<Lights> {
        Ok(Lights::new(self.light_file()?))
    }

    pub fn land_textures(&self) -> Result<LandTextures> {
        Ok(LandTextures::new(self.texture_file()?))
    }

    pub fn sounds(&self) -> Result<Sounds> {
        Ok(Sounds::new(self.sound_file()?))
    }

    pub fn multis(&self) -> Result<Multis> {
        Ok(Multis::new(self.multi_file()?))
    }

    /// Composites a multi structure out of its static art.
    pub fn multi_image(&self, id: u32) -> Result<Bitmap16> {
        let art = self.art()?;
        self.multis()?.multi(id)?.image(&art)
    }

    /// The ten packed ASCII fonts, loaded once per instance.
    pub fn ascii_fonts(&self) -> Result<Arc<Vec<AsciiFont>>> {
        if let Some(found) = self.ascii_fonts.get() {
            return Ok(found.clone());
        }
        let fonts = Arc::new(fonts::load_ascii(&*self.fonts_file()?)?);
        Ok(self.ascii_fonts.get_or_init(|| fonts).clone())
    }

    pub fn unicode_font(&self, index: u32) -> Result<UnicodeFont> {
        Ok(UnicodeFont::new(self.unifont_file(index)?))
    }
}

impl Drop for UoFiles {
    fn drop(&mut self) {
        self.close();
    }
}
