//! File-backed mapping from predecessor token to [`SingleGram`] row.
//!
//! Keys are the little-endian bytes of the predecessor token and values are
//! the raw row bytes, so a database file can be inspected or produced by
//! anything that speaks the row wire format.
//!
//! [`Bigram::load`] always returns a row that owns its bytes. A loaded row
//! stays valid across later loads, stores and a [`Bigram::reset`].

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::path::Path;

use filekv::{Config, Database, OpenOptions};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::{decode_key, encode_key, Token};
use crate::single_gram::SingleGram;

/// Access mode for [`Bigram::attach`].
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct AttachFlags(u32);

impl AttachFlags {
    /// No write access.
    pub const READONLY: Self = Self(1 << 0);
    /// Read and write access to an existing file.
    pub const READWRITE: Self = Self(1 << 1);
    /// Create the file if it does not exist. Implies write access.
    pub const CREATE: Self = Self(1 << 2);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    fn open_options(self) -> Result<OpenOptions> {
        let read_only = self.contains(Self::READONLY);
        let create = self.contains(Self::CREATE);
        if read_only && (self.contains(Self::READWRITE) || create) {
            return Err(Error::InvalidFlags(self));
        }
        Ok(OpenOptions { read_only, create })
    }
}

impl BitOr for AttachFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AttachFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for AttachFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::READONLY, "READONLY"),
            (Self::READWRITE, "READWRITE"),
            (Self::CREATE, "CREATE"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            write!(f, "AttachFlags(empty)")
        } else {
            write!(f, "AttachFlags({})", set.join(" | "))
        }
    }
}

/// Store of bigram rows keyed by predecessor token.
///
/// Holds at most one database attachment and no row cache. Not internally
/// synchronized beyond what [`Database`] provides; callers serialize writers.
///
/// With the default [`Config`], [`Bigram::store`] and [`Bigram::remove`]
/// rewrite the attached file before returning, so a write failure is
/// reported by the call that caused it. With `sync_on_write` turned off,
/// changes live only in memory until [`Bigram::sync`], [`Bigram::reset`],
/// a new [`Bigram::attach`] or drop; a failure on drop is only logged.
/// Stores into a database brought in by [`Bigram::load_db`] never touch a
/// file until [`Bigram::save_db`].
pub struct Bigram {
    db: Option<Database>,
    config: Config,
}

impl Bigram {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self { db: None, config }
    }

    pub fn is_attached(&self) -> bool {
        self.db.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.db.as_ref().is_some_and(|db| !db.is_read_only())
    }

    fn db(&self) -> Result<&Database> {
        self.db.as_ref().ok_or(Error::NotAttached)
    }

    fn writable_db(&self) -> Result<&Database> {
        match &self.db {
            Some(db) if !db.is_read_only() => Ok(db),
            _ => Err(Error::NotAttached),
        }
    }

    /// Open `path` under `flags`, replacing any current attachment.
    ///
    /// The previous attachment is closed even if opening `path` fails.
    pub fn attach(&mut self, path: impl AsRef<Path>, flags: AttachFlags) -> Result<()> {
        self.reset()?;
        let options = flags.open_options()?;
        let path = path.as_ref();
        let db = Database::open(path, options, self.config.clone())?;
        debug!(path = %path.display(), ?flags, rows = db.len(), "attached bigram store");
        self.db = Some(db);
        Ok(())
    }

    /// Close the current attachment, if any. Writable attachments are synced.
    pub fn reset(&mut self) -> Result<()> {
        match self.db.take() {
            Some(db) => Ok(db.close()?),
            None => Ok(()),
        }
    }

    /// Write pending changes of a writable attachment to its file.
    pub fn sync(&self) -> Result<()> {
        Ok(self.db()?.sync()?)
    }

    /// Load an owned copy of the row stored under `token`.
    pub fn load(&self, token: Token) -> Result<SingleGram> {
        let bytes = self
            .db()?
            .get(&encode_key(token))?
            .ok_or(Error::NotFound(token))?;
        SingleGram::from_bytes(bytes)
    }

    /// Store `gram` under `token`, replacing any previous row.
    pub fn store(&self, token: Token, gram: &SingleGram) -> Result<()> {
        self.writable_db()?.put(&encode_key(token), gram.as_bytes())?;
        Ok(())
    }

    /// Delete the row stored under `token`.
    pub fn remove(&self, token: Token) -> Result<()> {
        if self.writable_db()?.delete(&encode_key(token))? {
            Ok(())
        } else {
            Err(Error::NotFound(token))
        }
    }

    /// Every predecessor token that has a stored row, ascending.
    pub fn get_all_items(&self) -> Result<Vec<Token>> {
        let db = self.db()?;
        let mut items = Vec::with_capacity(db.len());
        db.for_each(|key, _| {
            let token = decode_key(key).ok_or_else(|| {
                filekv::Error::corrupt(format!("key of {} bytes is not a token", key.len()))
            })?;
            items.push(token);
            Ok(())
        })?;
        items.sort_unstable();
        Ok(items)
    }

    /// Replace the attachment with a writable in-memory copy of `path`.
    ///
    /// `path` is opened read-only and left untouched. On failure nothing is
    /// attached.
    pub fn load_db(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.reset()?;
        let path = path.as_ref();
        let source = Database::open(path, OpenOptions::read_only(), self.config.clone())?;
        let scratch = Database::memory(self.config.clone());
        let copied = source.copy_into(&scratch)?;
        debug!(path = %path.display(), rows = copied, "loaded bigram database");
        self.db = Some(scratch);
        Ok(())
    }

    /// Write every row of the current attachment to a fresh file at `path`.
    ///
    /// An existing file at `path` is removed first.
    pub fn save_db(&self, path: impl AsRef<Path>) -> Result<()> {
        let db = self.db()?;
        let path = path.as_ref();
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        let written = db.export(path)?;
        debug!(path = %path.display(), rows = written, "saved bigram database");
        Ok(())
    }
}

impl Default for Bigram {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Bigram {
    fn drop(&mut self) {
        if let Err(e) = self.reset() {
            warn!(error = %e, "failed to close bigram store");
        }
    }
}
