//! Packed frequency row for one predecessor token.
//!
//! A [`SingleGram`] is a single byte buffer: a `u32` aggregate counter
//! followed by `(token, count)` records sorted strictly ascending by token.
//! The buffer is exactly what the store persists, so loading and storing a
//! row is a plain byte copy.
//!
//! The aggregate counter ("total") is managed by the caller. Inserting,
//! removing or updating records never touches it; it is the divisor used for
//! normalized frequencies and usually tracks how often the predecessor was
//! observed, which is not necessarily the sum of the stored counts.

use std::ops::Range;

use crate::chunk::Chunk;
use crate::error::{Error, Result};
use crate::record::{
    BigramPhraseItem, BigramPhraseItemWithCount, FreqRecord, Token, HEADER_SIZE, RECORD_SIZE,
};

/// Sorted `(token, count)` records plus an aggregate counter.
#[derive(Clone, PartialEq, Eq)]
pub struct SingleGram {
    chunk: Chunk,
}

impl SingleGram {
    /// An empty row with a zero total.
    pub fn new() -> Self {
        let mut chunk = Chunk::new();
        chunk.set_size(HEADER_SIZE);
        Self { chunk }
    }

    /// Adopt the wire bytes of a row.
    ///
    /// Fails with [`Error::Corrupt`] if the header is truncated, the payload is
    /// not a whole number of records, or the tokens are not strictly ascending.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::corrupt(format!(
                "row is {} bytes, shorter than its header",
                bytes.len()
            )));
        }
        let payload = bytes.len() - HEADER_SIZE;
        if payload % RECORD_SIZE != 0 {
            return Err(Error::corrupt(format!(
                "row payload of {payload} bytes is not a multiple of {RECORD_SIZE}"
            )));
        }

        let gram = Self {
            chunk: Chunk::from_vec(bytes),
        };
        let mut prev: Option<Token> = None;
        for rec in gram.iter() {
            if prev.is_some_and(|p| p >= rec.token) {
                return Err(Error::corrupt(format!(
                    "row tokens out of order at token {}",
                    rec.token
                )));
            }
            prev = Some(rec.token);
        }
        Ok(gram)
    }

    /// Build a row from records in any order.
    ///
    /// Fails with [`Error::AlreadyExists`] on a duplicate token.
    pub fn from_records<I>(total: u32, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = FreqRecord>,
    {
        let mut gram = Self::new();
        gram.set_total_freq(total);
        for rec in records {
            gram.insert_freq(rec.token, rec.count)?;
        }
        Ok(gram)
    }

    /// The wire bytes of this row.
    pub fn as_bytes(&self) -> &[u8] {
        self.chunk.as_slice()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.chunk.into_vec()
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        (self.chunk.len() - HEADER_SIZE) / RECORD_SIZE
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn offset_of(idx: usize) -> usize {
        HEADER_SIZE + idx * RECORD_SIZE
    }

    #[inline]
    fn record_at(&self, idx: usize) -> FreqRecord {
        let off = Self::offset_of(idx);
        FreqRecord::decode(&self.chunk.as_slice()[off..off + RECORD_SIZE])
    }

    #[inline]
    fn token_at(&self, idx: usize) -> Token {
        self.chunk.read_u32_le(Self::offset_of(idx))
    }

    /// Index of the first record whose token is not less than `token`.
    fn lower_bound(&self, token: Token) -> usize {
        let mut lo = 0;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.token_at(mid) < token {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Index of the record holding exactly `token`.
    fn find(&self, token: Token) -> Option<usize> {
        let idx = self.lower_bound(token);
        (idx < self.len() && self.token_at(idx) == token).then_some(idx)
    }

    pub fn get_total_freq(&self) -> u32 {
        self.chunk.read_u32_le(0)
    }

    pub fn set_total_freq(&mut self, total: u32) {
        self.chunk.write_u32_le(0, total);
    }

    /// Sum of all record counts.
    pub fn sum_freq(&self) -> u64 {
        self.iter().map(|r| u64::from(r.count)).sum()
    }

    pub fn get_freq(&self, token: Token) -> Result<u32> {
        self.find(token)
            .map(|idx| self.record_at(idx).count)
            .ok_or(Error::NotFound(token))
    }

    /// Overwrite the count of an existing record. Never inserts.
    pub fn set_freq(&mut self, token: Token, count: u32) -> Result<()> {
        let idx = self.find(token).ok_or(Error::NotFound(token))?;
        self.chunk.write_u32_le(Self::offset_of(idx) + 4, count);
        Ok(())
    }

    /// Insert a new record at its sorted position.
    ///
    /// Leaves the row untouched and fails with [`Error::AlreadyExists`] if the
    /// token is present. The total is not updated.
    pub fn insert_freq(&mut self, token: Token, count: u32) -> Result<()> {
        let idx = self.lower_bound(token);
        if idx < self.len() && self.token_at(idx) == token {
            return Err(Error::AlreadyExists(token));
        }
        let rec = FreqRecord::new(token, count);
        self.chunk.insert_content(Self::offset_of(idx), &rec.encode());
        Ok(())
    }

    /// Remove a record, returning its count. The total is not updated.
    pub fn remove_freq(&mut self, token: Token) -> Result<u32> {
        let idx = self.find(token).ok_or(Error::NotFound(token))?;
        let count = self.record_at(idx).count;
        self.chunk.remove_content(Self::offset_of(idx), RECORD_SIZE);
        Ok(count)
    }

    /// Iterate over the records in ascending token order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = FreqRecord> + '_ {
        self.chunk.as_slice()[HEADER_SIZE..]
            .chunks_exact(RECORD_SIZE)
            .map(FreqRecord::decode)
    }

    fn checked_total(&self, emitting: bool) -> Result<f32> {
        let total = self.get_total_freq();
        if emitting && total == 0 {
            return Err(Error::ZeroTotal);
        }
        Ok(total as f32)
    }

    /// Every record with its normalized frequency `count / total`.
    ///
    /// Fails with [`Error::ZeroTotal`] if the row has records but a zero total.
    pub fn retrieve_all(&self) -> Result<Vec<BigramPhraseItemWithCount>> {
        let total = self.checked_total(!self.is_empty())?;
        Ok(self
            .iter()
            .map(|r| BigramPhraseItemWithCount {
                token: r.token,
                count: r.count,
                freq: r.count as f32 / total,
            })
            .collect())
    }

    /// Records with `range.start <= token < range.end`, normalized by the total.
    ///
    /// Fails with [`Error::ZeroTotal`] if anything would be returned while the
    /// total is zero.
    pub fn search(&self, range: Range<Token>) -> Result<Vec<BigramPhraseItem>> {
        let first = self.lower_bound(range.start);
        let end = if range.end > range.start {
            self.lower_bound(range.end)
        } else {
            first
        };
        let total = self.checked_total(first < end)?;
        Ok((first..end)
            .map(|idx| {
                let r = self.record_at(idx);
                BigramPhraseItem {
                    token: r.token,
                    freq: r.count as f32 / total,
                }
            })
            .collect())
    }

    /// Age the row: decrement every count by one and drop records that reach
    /// zero, reducing the total by the number of dropped records.
    ///
    /// Never called implicitly. Returns the number of dropped records.
    pub fn prune(&mut self) -> usize {
        let mut kept = Chunk::new();
        kept.set_size(HEADER_SIZE);
        let mut dropped = 0usize;
        for rec in self.iter() {
            let count = rec.count.saturating_sub(1);
            if count == 0 {
                dropped += 1;
                continue;
            }
            let len = kept.len();
            kept.insert_content(len, &FreqRecord::new(rec.token, count).encode());
        }

        let total = self
            .get_total_freq()
            .saturating_sub(u32::try_from(dropped).unwrap_or(u32::MAX));
        kept.write_u32_le(0, total);
        kept.shrink_to_fit();
        self.chunk = kept;
        dropped
    }
}

impl Default for SingleGram {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SingleGram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleGram")
            .field("total", &self.get_total_freq())
            .field("records", &self.iter().map(|r| (r.token, r.count)).collect::<Vec<_>>())
            .finish()
    }
}
