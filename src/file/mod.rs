//! The asset-file access layer: one [`UoFile`] per client data file,
//! backed either by a classic MUL (+ optional IDX) pair or by a UOP
//! archive, both presenting the same "entry(id) -> bytes + extra" view.

pub(crate) mod intmap;
pub(crate) mod mul;
pub(crate) mod uop;

use memmap2::Mmap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use crate::errors::{Result, UoError};
use intmap::IntMap;
use mul::IndexRecord;

/// A structural decoder walks a whole data file at open time and emits
/// synthetic entries through the `add(id, extra, payload)` sink; used for
/// the files whose layout is not a fixed-record index (cliloc, tiledata,
/// speech).
pub(crate) type StructuralDecoder =
    Box<dyn FnOnce(&[u8], &str, &mut dyn FnMut(u32, u64, Vec<u8>)) -> Result<()> + Send>;

/// How to locate and parse one logical client file.
pub(crate) struct FileSpec {
    /// Candidate filenames probed in order; an archive candidate wins when
    /// present.
    pub candidates: Vec<String>,
    /// On-disk index record width. 12 everywhere but `skills.idx` (16).
    pub stride: u32,
    /// When no index file exists, slice the data file into entries of this
    /// many bytes (0 disables; the whole file becomes entry 0).
    pub chunk: u32,
    /// Logical id ceiling; archive entries are probed for every id below it.
    pub capacity: u32,
    /// Archive path stem, e.g. `gumpartlegacymul`.
    pub stem: Option<String>,
    /// Digits of the archive path's decimal id.
    pub digits: usize,
    /// Archive payloads start with two u32 dimensions that are promoted
    /// into the 64-bit extra word and stripped from the payload.
    pub extra_prefix: bool,
    /// Verify the per-entry adler32 of archive data blocks.
    pub verify_checksums: bool,
    pub decoder: Option<StructuralDecoder>,
}

impl FileSpec {
    pub fn new<S: AsRef<str>>(candidates: &[S]) -> Self {
        Self {
            candidates: candidates.iter().map(|c| c.as_ref().to_owned()).collect(),
            stride: IndexRecord::PACKED_SIZE,
            chunk: 0,
            capacity: 0x10000,
            stem: None,
            digits: 8,
            extra_prefix: false,
            verify_checksums: false,
            decoder: None,
        }
    }
}

struct Entry {
    id: u32,
    offset: u64,
    length: u32,
    decompressed: u32,
    extra: u64,
    compression: u16,
    adler32: u32,
    hole: bool,
    cache: OnceLock<Arc<[u8]>>,
}

impl Entry {
    fn from_index_record(id: u32, record: &IndexRecord) -> Self {
        Self {
            id,
            offset: record.lookup as u64,
            length: record.size,
            decompressed: record.size,
            extra: record.extra as u64,
            compression: 0,
            adler32: 0,
            hole: record.is_hole(),
            cache: OnceLock::new(),
        }
    }

    fn decoded(id: u32, extra: u64, payload: Vec<u8>) -> Self {
        let entry = Self {
            id,
            offset: 0,
            length: payload.len() as u32,
            decompressed: payload.len() as u32,
            extra,
            compression: 0,
            adler32: 0,
            hole: false,
            cache: OnceLock::new(),
        };
        let _ = entry.cache.set(Arc::from(payload));
        entry
    }
}

/// One opened client data file. Resolution picked the backing format; all
/// reads go through the uniform entry table. Decoded entry bytes are cached
/// for the life of the handle (first writer wins, identical bytes).
pub(crate) struct UoFile {
    name: String,
    path: PathBuf,
    archive: bool,
    backing: Option<Mmap>,
    entries: Vec<Entry>,
    positions: IntMap,
    sorted_ids: Vec<u32>,
    verify_checksums: bool,
}

impl UoFile {
    pub fn open(dir: &Path, spec: FileSpec) -> Result<UoFile> {
        let present: Vec<String> = spec
            .candidates
            .iter()
            .filter(|name| dir.join(name.as_str()).is_file())
            .cloned()
            .collect();
        let Some(first) = present.first() else {
            return Err(UoError::io(
                spec.candidates.first().map(String::as_str).unwrap_or("?"),
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("none of {:?} present in client directory", spec.candidates),
                ),
            ));
        };

        if first.to_ascii_lowercase().ends_with(".uop") {
            Self::open_archive(dir, first, &spec)
        } else {
            Self::open_mul(dir, &present, spec)
        }
    }

    fn map_file(path: &Path, name: &str) -> Result<Mmap> {
        let handle = File::open(path).map_err(|e| UoError::io(name, e))?;
        // Read-only mapping of a file we never write to.
        unsafe { Mmap::map(&handle) }.map_err(|e| UoError::io(name, e))
    }

    fn open_mul(dir: &Path, present: &[String], spec: FileSpec) -> Result<UoFile> {
        let is_index = |name: &str| name.to_ascii_lowercase().contains("idx");
        let data_name = present
            .iter()
            .find(|name| !is_index(name))
            .cloned()
            .ok_or_else(|| {
                UoError::invalid(&present[0], "only an index file present, no data file")
            })?;
        let index_name = present.iter().find(|name| is_index(name)).cloned();

        let path = dir.join(data_name.as_str());
        let backing = Self::map_file(&path, &data_name)?;

        let mut file = UoFile {
            name: data_name.clone(),
            path,
            archive: false,
            backing: Some(backing),
            entries: Vec::new(),
            positions: IntMap::with_capacity(0),
            sorted_ids: Vec::new(),
            verify_checksums: spec.verify_checksums,
        };

        if let Some(decoder) = spec.decoder {
            let data = file.backing.as_ref().expect("just mapped");
            let mut produced: Vec<(u32, u64, Vec<u8>)> = Vec::new();
            decoder(&data[..], &file.name, &mut |id, extra, payload| {
                produced.push((id, extra, payload));
            })?;
            file.backing = None; // entries own their bytes now
            file.positions = IntMap::with_capacity(produced.len());
            file.entries.reserve(produced.len());
            for (id, extra, payload) in produced {
                file.positions.store(id, file.entries.len() as u32);
                file.sorted_ids.push(id);
                file.entries.push(Entry::decoded(id, extra, payload));
            }
            file.sorted_ids.sort_unstable();
            file.sorted_ids.dedup();
        } else {
            let records = match index_name {
                Some(index_name) => {
                    let index_bytes = std::fs::read(dir.join(index_name.as_str()))
                        .map_err(|e| UoError::io(&index_name, e))?;
                    mul::load_index(&index_bytes, spec.stride, &index_name)?
                }
                None => {
                    let data_len = file.backing.as_ref().map(|m| m.len() as u64).unwrap_or(0);
                    mul::synthesize_index(data_len, spec.chunk, &file.name)?
                }
            };
            file.positions = IntMap::with_capacity(records.len());
            file.entries.reserve(records.len());
            for (id, record) in records.iter().enumerate() {
                let id = id as u32;
                file.positions.store(id, file.entries.len() as u32);
                if !record.is_hole() {
                    file.sorted_ids.push(id);
                }
                file.entries.push(Entry::from_index_record(id, record));
            }
        }

        tracing::debug!(file = %file.name, entries = file.sorted_ids.len(), "opened mul file");
        Ok(file)
    }

    fn open_archive(dir: &Path, name: &String, spec: &FileSpec) -> Result<UoFile> {
        let stem = spec.stem.as_deref().ok_or_else(|| {
            UoError::invalid(name, "archive candidate listed without a path stem")
        })?;
        let path = dir.join(name.as_str());
        let backing = Self::map_file(&path, name)?;
        let records = uop::parse_archive(&backing[..], name)?;

        let mut file = UoFile {
            name: name.clone(),
            path,
            archive: true,
            backing: Some(backing),
            entries: Vec::with_capacity(spec.capacity as usize),
            positions: IntMap::with_capacity(records.len()),
            sorted_ids: Vec::with_capacity(records.len()),
            verify_checksums: spec.verify_checksums,
        };

        for id in 0..spec.capacity {
            let logical = uop::entry_path(stem, spec.digits, id);
            let Some(record) = records.get(&uop::uop_hash(logical.as_bytes())) else {
                continue;
            };
            file.positions.store(id, file.entries.len() as u32);
            file.sorted_ids.push(id);
            file.entries.push(Entry {
                id,
                offset: record.data_offset + record.header_length as u64,
                length: record.compressed_length,
                decompressed: record.decompressed_length,
                extra: 0,
                compression: record.compression,
                adler32: record.adler32,
                hole: false,
                cache: OnceLock::new(),
            });
        }

        if spec.extra_prefix {
            file.promote_extra_prefixes()?;
        }

        tracing::debug!(file = %file.name, entries = file.sorted_ids.len(), "opened archive");
        Ok(file)
    }

    /// Pre-decompresses every archive entry, lifts the leading (width,
    /// height) pair into the 64-bit extra word and caches the remainder.
    fn promote_extra_prefixes(&mut self) -> Result<()> {
        for pos in 0..self.entries.len() {
            let payload = self.load_entry_bytes(pos)?;
            let entry = &mut self.entries[pos];
            if payload.len() < 8 {
                entry.hole = true;
                continue;
            }
            let width = u32::from_le_bytes(payload[0..4].try_into().expect("8-byte prefix"));
            let height = u32::from_le_bytes(payload[4..8].try_into().expect("8-byte prefix"));
            entry.extra = width as u64 | (height as u64) << 32;
            entry.cache = OnceLock::new();
            let _ = entry.cache.set(Arc::from(&payload[8..]));
            entry.length = payload.len() as u32 - 8;
            entry.decompressed = entry.length;
        }
        let holes: Vec<u32> = self
            .entries
            .iter()
            .filter(|e| e.hole)
            .map(|e| e.id)
            .collect();
        self.sorted_ids.retain(|id| !holes.contains(id));
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_archive(&self) -> bool {
        self.archive
    }

    /// Byte size of the mapped backing, 0 for decoded-only handles.
    pub fn backing_len(&self) -> u64 {
        self.backing.as_ref().map(|m| m.len() as u64).unwrap_or(0)
    }

    /// Ids with actual data, in increasing order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.sorted_ids.iter().copied()
    }

    pub fn present_count(&self) -> usize {
        self.sorted_ids.len()
    }

    fn entry(&self, id: u32) -> Result<(usize, &Entry)> {
        let pos = self
            .positions
            .load(id)
            .ok_or_else(|| UoError::not_found(&self.name, id))? as usize;
        let entry = &self.entries[pos];
        if entry.hole {
            return Err(UoError::not_found(&self.name, id));
        }
        Ok((pos, entry))
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entry(id).is_ok()
    }

    pub fn extra(&self, id: u32) -> Result<u64> {
        Ok(self.entry(id)?.1.extra)
    }

    pub fn entry_len(&self, id: u32) -> Result<u32> {
        Ok(self.entry(id)?.1.decompressed)
    }

    fn backing_slice(&self, offset: u64, length: u32, id: u32) -> Result<&[u8]> {
        let backing = self.backing.as_ref().ok_or_else(|| {
            UoError::invalid(&self.name, format!("entry {id} has no backing storage"))
        })?;
        let end = offset
            .checked_add(length as u64)
            .filter(|&end| end <= backing.len() as u64)
            .ok_or_else(|| {
                UoError::truncated(
                    &self.name,
                    format!("entry {id} claims {length} bytes at offset {offset}"),
                )
            })?;
        Ok(&backing[offset as usize..end as usize])
    }

    fn load_entry_bytes(&self, pos: usize) -> Result<Arc<[u8]>> {
        let entry = &self.entries[pos];
        if let Some(bytes) = entry.cache.get() {
            return Ok(bytes.clone());
        }
        let id = entry.id;
        let raw = self.backing_slice(entry.offset, entry.length, id)?;
        if self.verify_checksums && self.archive && uop::adler32(raw) != entry.adler32 {
            return Err(UoError::ChecksumMismatch {
                file: self.name.clone(),
                id,
            });
        }
        let bytes: Arc<[u8]> = match entry.compression {
            0 => Arc::from(raw),
            1 => inflate(raw, entry.decompressed, &self.name, id)?.into(),
            kind => {
                return Err(UoError::UnsupportedCompression {
                    file: self.name.clone(),
                    kind,
                });
            }
        };
        // First writer wins; concurrent decoders produce identical bytes.
        let _ = entry.cache.set(bytes);
        Ok(entry.cache.get().expect("just initialized").clone())
    }

    /// The whole decoded payload of an entry. The first read caches the
    /// bytes in the entry record; later reads return the same buffer.
    pub fn read_full(&self, id: u32) -> Result<Arc<[u8]>> {
        let (pos, _) = self.entry(id)?;
        self.load_entry_bytes(pos)
    }

    /// Reads part of an entry into `buf`, returning the byte count. Serves
    /// straight from the mapped backing when the entry is stored raw, so
    /// large entries (map blocks) are not copied wholesale.
    pub fn read_at(&self, id: u32, buf: &mut [u8], offset: u64) -> Result<usize> {
        let (pos, entry) = self.entry(id)?;
        if let Some(bytes) = entry.cache.get() {
            return Ok(copy_out(bytes, buf, offset));
        }
        if entry.compression == 0 && !(self.verify_checksums && self.archive) {
            let raw = self.backing_slice(entry.offset, entry.length, id)?;
            return Ok(copy_out(raw, buf, offset));
        }
        let bytes = self.load_entry_bytes(pos)?;
        Ok(copy_out(&bytes, buf, offset))
    }

    /// Decodes an entry in place: `f` receives the payload and the extra
    /// word.
    pub fn decode<T>(&self, id: u32, f: impl FnOnce(&[u8], u64) -> Result<T>) -> Result<T> {
        let (pos, entry) = self.entry(id)?;
        let extra = entry.extra;
        let bytes = self.load_entry_bytes(pos)?;
        f(&bytes, extra)
    }
}

fn copy_out(src: &[u8], buf: &mut [u8], offset: u64) -> usize {
    if offset >= src.len() as u64 {
        return 0;
    }
    let src = &src[offset as usize..];
    let n = src.len().min(buf.len());
    buf[..n].copy_from_slice(&src[..n]);
    n
}

fn inflate(raw: &[u8], expected: u32, file: &str, id: u32) -> Result<Vec<u8>> {
    // The declared size is a hint, not a promise.
    let mut out = Vec::with_capacity((expected as usize).min(0x400_0000));
    flate2::read::ZlibDecoder::new(raw)
        .read_to_end(&mut out)
        .map_err(|e| UoError::invalid(file, format!("zlib entry {id}: {e}")))?;
    if out.len() != expected as usize {
        tracing::warn!(
            file,
            id,
            expected,
            actual = out.len(),
            "decompressed size differs from the declared one"
        );
    }
    Ok(out)
}
