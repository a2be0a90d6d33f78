//! # ngram-store
//!
//! Bigram frequency storage for a predictive text engine.
//!
//! For every predecessor token the store keeps one [`SingleGram`]: the
//! successor tokens seen after it, each with a co-occurrence count, plus an
//! aggregate counter used to turn counts into conditional frequencies. Rows
//! are packed into a single byte buffer and persisted verbatim, keyed by the
//! predecessor token, in a [`filekv`] database managed by [`Bigram`].
//!
//! ## Example
//!
//! ```rust
//! use ngram_store::{AttachFlags, Bigram, SingleGram};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("bigram.db");
//!
//! let mut row = SingleGram::new();
//! row.insert_freq(5, 10).unwrap();
//! row.insert_freq(3, 7).unwrap();
//! row.set_total_freq(17);
//!
//! let mut store = Bigram::new();
//! store.attach(&path, AttachFlags::CREATE).unwrap();
//! store.store(42, &row).unwrap();
//!
//! let loaded = store.load(42).unwrap();
//! assert_eq!(loaded.get_freq(5).unwrap(), 10);
//! assert_eq!(store.get_all_items().unwrap(), vec![42]);
//! ```

#![deny(unsafe_code)]

pub mod bigram;
pub mod chunk;
pub mod error;
pub mod record;
pub mod single_gram;

pub use bigram::{AttachFlags, Bigram};
pub use error::{Error, Result};
pub use filekv::Config;
pub use record::{
    BigramPhraseItem, BigramPhraseItemWithCount, FreqRecord, Token, HEADER_SIZE, KEY_SIZE,
    RECORD_SIZE,
};
pub use single_gram::SingleGram;

#[cfg(test)]
mod proptests;
