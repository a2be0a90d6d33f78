//! # filekv - Small File-Backed Key-Value Database
//!
//! A single-file key-value database with two access modes:
//!
//! - **Read-only**: the file is memory-mapped and keys are looked up through an
//!   FST index, so opening a large table costs no parsing.
//! - **Read-write**: the file is loaded into a sorted in-memory table. With
//!   [`Config::sync_on_write`] (the default) every write rewrites the file
//!   atomically before returning. Otherwise writes reach the file on
//!   [`Database::sync`] or [`Database::close`].
//!
//! A database with no backing file ([`Database::memory`]) is a scratch table
//! that is never written anywhere.
//!
//! ## Example
//!
//! ```rust
//! use filekv::{Config, Database};
//!
//! let db = Database::memory(Config::default());
//! db.put(b"user:1001", b"alice").unwrap();
//!
//! assert_eq!(db.get(b"user:1001").unwrap(), Some(b"alice".to_vec()));
//! assert_eq!(db.get(b"user:1002").unwrap(), None);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod error;
pub mod frozen;
pub mod simple;

pub use error::{Error, Result};
pub use frozen::FrozenTable;
pub use simple::MemTable;

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, warn};

/// Configuration for opening databases.
#[derive(Debug, Clone)]
pub struct Config {
    /// Permission bits for files created by [`Database::open`].
    pub file_mode: u32,
    /// Permission bits for exported files.
    pub export_mode: u32,
    /// Write dirty writable databases back to disk on close.
    pub sync_on_close: bool,
    /// Rewrite the backing file after every `put` and `delete`.
    pub sync_on_write: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_mode: 0o644,
            export_mode: 0o600,
            sync_on_close: true,
            sync_on_write: true,
        }
    }
}

/// How to open a database file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Open without write access.
    pub read_only: bool,
    /// Create the file if it does not exist. Implies write access.
    pub create: bool,
}

impl OpenOptions {
    /// Read-only access to an existing file.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            create: false,
        }
    }

    /// Read-write access to an existing file.
    pub fn read_write() -> Self {
        Self::default()
    }

    /// Read-write access, creating the file if needed.
    pub fn create() -> Self {
        Self {
            read_only: false,
            create: true,
        }
    }
}

enum Storage {
    Frozen(FrozenTable),
    Mem { table: MemTable, dirty: bool },
}

/// A key-value database attached to at most one file.
///
/// All methods take `&self`; concurrent readers share a read lock and writers
/// take the write lock for the duration of a single call.
pub struct Database {
    storage: RwLock<Storage>,
    path: Option<PathBuf>,
    config: Config,
    closed: bool,
}

impl Database {
    /// Open the database file at `path`.
    ///
    /// A missing file is an I/O error unless `options.create` is set, in which
    /// case an empty database file is written immediately. With `create`, an
    /// existing zero-length file is initialized the same way.
    pub fn open(path: impl AsRef<Path>, options: OpenOptions, config: Config) -> Result<Self> {
        let path = path.as_ref();

        let storage = if options.read_only {
            Storage::Frozen(FrozenTable::open(path)?)
        } else if options.create && is_missing_or_empty(path)? {
            frozen::write_table(path, config.file_mode, std::iter::empty::<(&[u8], &[u8])>())?;
            Storage::Mem {
                table: MemTable::new(),
                dirty: false,
            }
        } else {
            let mut table = MemTable::new();
            FrozenTable::open(path)?.for_each(|k, v| {
                table.insert(k, v.to_vec());
                Ok(())
            })?;
            Storage::Mem {
                table,
                dirty: false,
            }
        };

        let db = Self {
            storage: RwLock::new(storage),
            path: Some(path.to_path_buf()),
            config,
            closed: false,
        };
        debug!(
            path = %path.display(),
            read_only = options.read_only,
            entries = db.len(),
            "opened database"
        );
        Ok(db)
    }

    /// Create a writable database with no backing file.
    pub fn memory(config: Config) -> Self {
        Self {
            storage: RwLock::new(Storage::Mem {
                table: MemTable::new(),
                dirty: false,
            }),
            path: None,
            config,
            closed: false,
        }
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether writes are rejected.
    pub fn is_read_only(&self) -> bool {
        matches!(*self.storage.read(), Storage::Frozen(_))
    }

    /// Get an owned copy of the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match &*self.storage.read() {
            Storage::Frozen(t) => Ok(t.get(key)?.map(<[u8]>::to_vec)),
            Storage::Mem { table, .. } => Ok(table.get(key).map(<[u8]>::to_vec)),
        }
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &[u8]) -> bool {
        match &*self.storage.read() {
            Storage::Frozen(t) => t.contains(key),
            Storage::Mem { table, .. } => table.contains(key),
        }
    }

    /// Insert or overwrite the value stored under `key`.
    ///
    /// The table keeps the new value even if the write-through to the file
    /// fails; the next successful sync persists it.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut storage = self.storage.write();
        match &mut *storage {
            Storage::Frozen(_) => return Err(Error::ReadOnly),
            Storage::Mem { table, dirty } => {
                table.insert(key, value.to_vec());
                *dirty = true;
            }
        }
        if self.config.sync_on_write {
            self.flush(&mut storage)?;
        }
        Ok(())
    }

    /// Remove `key`. Returns whether it was present.
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        let mut storage = self.storage.write();
        let existed = match &mut *storage {
            Storage::Frozen(_) => return Err(Error::ReadOnly),
            Storage::Mem { table, dirty } => {
                let existed = table.remove(key).is_some();
                *dirty |= existed;
                existed
            }
        };
        if existed && self.config.sync_on_write {
            self.flush(&mut storage)?;
        }
        Ok(existed)
    }

    /// Walk every entry in ascending key order.
    ///
    /// The database is read-locked for the whole walk, so `f` must not call
    /// back into a write method of the same database.
    pub fn for_each<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        match &*self.storage.read() {
            Storage::Frozen(t) => t.for_each(f),
            Storage::Mem { table, .. } => {
                for (k, v) in table.iter() {
                    f(k, v)?;
                }
                Ok(())
            }
        }
    }

    /// Collect every key in ascending order.
    pub fn keys(&self) -> Result<Vec<Vec<u8>>> {
        let mut keys = Vec::with_capacity(self.len());
        self.for_each(|k, _| {
            keys.push(k.to_vec());
            Ok(())
        })?;
        Ok(keys)
    }

    /// Copy every entry of `self` into `dest`.
    ///
    /// Returns the number of entries copied.
    pub fn copy_into(&self, dest: &Database) -> Result<usize> {
        let mut copied = 0usize;
        self.for_each(|k, v| {
            dest.put(k, v)?;
            copied += 1;
            Ok(())
        })?;
        Ok(copied)
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        match &*self.storage.read() {
            Storage::Frozen(t) => t.len(),
            Storage::Mem { table, .. } => table.len(),
        }
    }

    /// Check if the database is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write pending changes to the backing file.
    ///
    /// A no-op for read-only, clean, or file-less databases.
    pub fn sync(&self) -> Result<()> {
        self.flush(&mut self.storage.write())
    }

    fn flush(&self, storage: &mut Storage) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Storage::Mem { table, dirty } = storage {
            if *dirty {
                let written = frozen::write_table(path, self.config.file_mode, table.iter())?;
                *dirty = false;
                debug!(path = %path.display(), entries = written, "synced database");
            }
        }
        Ok(())
    }

    /// Write the full contents to a fresh file at `path`.
    ///
    /// Works in every access mode, including file-less databases.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let mode = self.config.export_mode;
        let written = match &*self.storage.read() {
            Storage::Mem { table, .. } => frozen::write_table(path, mode, table.iter())?,
            Storage::Frozen(t) => {
                let mut entries = Vec::with_capacity(t.len());
                t.for_each(|k, v| {
                    entries.push((k.to_vec(), v.to_vec()));
                    Ok(())
                })?;
                frozen::write_table(
                    path,
                    mode,
                    entries.iter().map(|(k, v)| (k.as_slice(), v.as_slice())),
                )?
            }
        };
        debug!(path = %path.display(), entries = written, "exported database");
        Ok(written)
    }

    /// Close the database, syncing first if configured to.
    ///
    /// A sync failure is returned here and not retried when the value drops.
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.config.sync_on_close {
            self.sync()?;
        }
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!(path = ?self.path, error = %e, "failed to sync database on drop");
        }
    }
}

fn is_missing_or_empty(path: &Path) -> Result<bool> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta.len() == 0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e.into()),
    }
}
