//! Read-only access to the data files of an Ultima Online client directory.
//!
//! Point [`UoFiles`] at a client directory and pull decoded, typed values out
//! of it: land/static art, gumps, animations, maps with their statics, hues,
//! tiledata, localized strings, and the smaller auxiliary tables. Both the
//! classic MUL+IDX pairs and the newer UOP archives are understood; callers
//! never see the difference.
//!
//! ```no_run
//! # fn main() -> uosdk::Result<()> {
//! let files = uosdk::UoFiles::open("/path/to/client")?;
//!
//! let tile = files.land_art(3)?;
//! println!("{}: {}x{}", tile.name(), tile.image().width(), tile.image().height());
//!
//! let map = files.tile_map(1)?;
//! let spot = map.tile_at(536, 970)?;
//! println!("land {:#x} at z {}", spot.land_id(), spot.z());
//!
//! println!("{}", files.cliloc()?.string(1_000_000)?);
//! # Ok(())
//! # }
//! ```

pub mod anim;
pub mod animdata;
pub mod art;
pub mod cliloc;
mod errors;
pub(crate) mod file;
pub mod fonts;
pub mod geo;
pub mod gumps;
pub mod hues;
pub mod light;
pub mod multis;
pub mod radarcol;
pub mod skills;
pub mod sound;
pub mod speech;
pub mod tiledata;
pub mod uo_files;
pub mod utils;

pub use errors::{Result, UoError};
pub use uo_files::UoFiles;
