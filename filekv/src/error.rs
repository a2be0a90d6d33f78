//! Error types for filekv.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by a [`Database`](crate::Database).
#[derive(Error, Debug)]
pub enum Error {
    /// Opening, reading, writing or renaming the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Building or reading the key index failed.
    #[error("FST error: {0}")]
    Fst(#[from] fst::Error),

    /// The backing file does not have the expected layout.
    #[error("corrupt database: {0}")]
    Corrupt(String),

    /// A write was attempted on a database opened read-only.
    #[error("database is read-only")]
    ReadOnly,
}

impl Error {
    /// Create a corruption error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::Corrupt(msg.into())
    }
}
