//! Error types for ngram-store.

use thiserror::Error;

use crate::bigram::AttachFlags;
use crate::record::Token;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by rows and stores.
#[derive(Error, Debug)]
pub enum Error {
    /// The operation needs an attached (and, for writes, writable) database.
    #[error("no database attached")]
    NotAttached,

    /// The attach flags contradict each other.
    #[error("invalid attach flags: {0:?}")]
    InvalidFlags(AttachFlags),

    /// The token is absent from the row or the store.
    #[error("token {0} not found")]
    NotFound(Token),

    /// The token is already present in the row.
    #[error("token {0} already exists")]
    AlreadyExists(Token),

    /// Normalized frequencies were requested from a row whose total is zero.
    #[error("row total frequency is zero")]
    ZeroTotal,

    /// Opening, creating, reading or writing a database file failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Stored bytes do not decode as a row or a token key.
    #[error("corrupt data: {0}")]
    Corrupt(String),
}

impl Error {
    /// Create a corruption error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Error::Corrupt(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<filekv::Error> for Error {
    fn from(e: filekv::Error) -> Self {
        match e {
            filekv::Error::Io(e) => Error::Io(e.to_string()),
            filekv::Error::Fst(e) => Error::Corrupt(e.to_string()),
            filekv::Error::Corrupt(msg) => Error::Corrupt(msg),
            filekv::Error::ReadOnly => Error::NotAttached,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(Error::from(filekv::Error::Io(io)), Error::Io(_)));
        assert!(matches!(
            Error::from(filekv::Error::corrupt("bad")),
            Error::Corrupt(m) if m == "bad"
        ));
        assert!(matches!(
            Error::from(filekv::Error::ReadOnly),
            Error::NotAttached
        ));
    }

    #[test]
    fn test_bad_index_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad-index.db");

        // Valid header describing a 3-byte index that is not an FST.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"FKV1");
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&3u64.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&[0xAB, 0xCD, 0xEF]);
        std::fs::write(&path, bytes).unwrap();

        let err = filekv::FrozenTable::open(&path).err().unwrap();
        assert!(matches!(err, filekv::Error::Fst(_)));
        assert!(matches!(Error::from(err), Error::Corrupt(_)));
    }
}
