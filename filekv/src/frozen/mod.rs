//! Immutable on-disk table: an FST key index plus a value region.
//!
//! File layout (all integers little-endian):
//!
//! ```text
//! [magic "FKV1"][version u32][entries u64][fst_len u64][values_len u64]
//! [fst bytes ........................................................]
//! [value 0: varint len][bytes][value 1: varint len][bytes] ...
//! ```
//!
//! The FST maps each key to the byte offset of its value inside the value
//! region. Tables are written once from sorted input and read through a
//! memory map.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fst::{Map, MapBuilder, Streamer};
use memmap2::Mmap;

use crate::encoding::{decode_bytes, encode_bytes};
use crate::error::{Error, Result};

/// File magic.
pub const MAGIC: [u8; 4] = *b"FKV1";
/// Current format version.
pub const VERSION: u32 = 1;
/// Size of the fixed header.
pub const HEADER_SIZE: usize = 32;

/// A byte range of a shared memory map.
#[derive(Clone)]
struct Region {
    mmap: Arc<Mmap>,
    start: usize,
    end: usize,
}

impl AsRef<[u8]> for Region {
    fn as_ref(&self) -> &[u8] {
        &self.mmap[self.start..self.end]
    }
}

/// A read-only table backed by a memory-mapped file.
pub struct FrozenTable {
    index: Map<Region>,
    values: Region,
    len: usize,
}

impl FrozenTable {
    /// Map an existing table file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        if file_len < HEADER_SIZE as u64 {
            return Err(Error::corrupt(format!(
                "{}: file is {} bytes, shorter than the header",
                path.display(),
                file_len
            )));
        }

        // SAFETY: the mapping is read-only and tables are replaced by rename,
        // never rewritten in place.
        let mmap = Arc::new(unsafe { Mmap::map(&file)? });
        let header = parse_header(&mmap[..HEADER_SIZE])?;

        let fst_end = HEADER_SIZE
            .checked_add(header.fst_len)
            .ok_or_else(|| Error::corrupt("fst length overflows"))?;
        let values_end = fst_end
            .checked_add(header.values_len)
            .ok_or_else(|| Error::corrupt("values length overflows"))?;
        if values_end != mmap.len() {
            return Err(Error::corrupt(format!(
                "{}: header describes {} bytes, file has {}",
                path.display(),
                values_end,
                mmap.len()
            )));
        }

        let index = Map::new(Region {
            mmap: Arc::clone(&mmap),
            start: HEADER_SIZE,
            end: fst_end,
        })?;
        if index.len() != header.entries {
            return Err(Error::corrupt(format!(
                "header lists {} entries, index has {}",
                header.entries,
                index.len()
            )));
        }

        Ok(Self {
            index,
            values: Region {
                mmap,
                start: fst_end,
                end: values_end,
            },
            len: header.entries,
        })
    }

    /// Get the value for a key, borrowed from the mapping.
    pub fn get(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        match self.index.get(key) {
            Some(offset) => self.value_at(offset).map(Some),
            None => Ok(None),
        }
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    /// Get number of keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the table contains no keys.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Visit every entry in ascending key order.
    ///
    /// Stops at the first error returned by `f`.
    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        let mut stream = self.index.stream();
        while let Some((key, offset)) = stream.next() {
            let value = self.value_at(offset)?;
            f(key, value)?;
        }
        Ok(())
    }

    fn value_at(&self, offset: u64) -> Result<&[u8]> {
        let values = self.values.as_ref();
        let start = usize::try_from(offset)
            .ok()
            .filter(|&o| o < values.len())
            .ok_or_else(|| Error::corrupt(format!("value offset {offset} out of range")))?;
        decode_bytes(&values[start..])
            .map(|(data, _)| data)
            .ok_or_else(|| Error::corrupt(format!("truncated value at offset {offset}")))
    }
}

struct Header {
    entries: usize,
    fst_len: usize,
    values_len: usize,
}

fn read_u64(buf: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(b)
}

fn parse_header(buf: &[u8]) -> Result<Header> {
    if buf[0..4] != MAGIC {
        return Err(Error::corrupt("bad magic"));
    }
    let version = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    if version != VERSION {
        return Err(Error::corrupt(format!("unsupported version {version}")));
    }
    let field = |at: usize, name: &str| {
        usize::try_from(read_u64(buf, at))
            .map_err(|_| Error::corrupt(format!("{name} does not fit in memory")))
    };
    Ok(Header {
        entries: field(8, "entry count")?,
        fst_len: field(16, "fst length")?,
        values_len: field(24, "values length")?,
    })
}

/// Write a table file from entries in ascending key order.
///
/// The table is written to a sibling temporary file, flushed to disk and then
/// renamed over `path`, so readers never observe a half-written table.
/// Returns the number of entries written.
pub fn write_table<'a, I>(path: &Path, mode: u32, entries: I) -> Result<usize>
where
    I: IntoIterator<Item = (&'a [u8], &'a [u8])>,
{
    let mut index = MapBuilder::memory();
    let mut values = Vec::new();
    let mut count = 0usize;
    for (key, value) in entries {
        index.insert(key, values.len() as u64)?;
        encode_bytes(value, &mut values);
        count += 1;
    }
    let index = index.into_inner()?;

    let tmp = temp_path(path);
    let result = (|| -> Result<()> {
        let file = create_file(&tmp, mode)?;
        let mut out = BufWriter::new(file);
        out.write_all(&MAGIC)?;
        out.write_all(&VERSION.to_le_bytes())?;
        out.write_all(&(count as u64).to_le_bytes())?;
        out.write_all(&(index.len() as u64).to_le_bytes())?;
        out.write_all(&(values.len() as u64).to_le_bytes())?;
        out.write_all(&index)?;
        out.write_all(&values)?;
        let file = out.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map(|()| count)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn create_file(path: &Path, mode: u32) -> Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)?)
}

#[cfg(not(unix))]
fn create_file(path: &Path, _mode: u32) -> Result<File> {
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}
