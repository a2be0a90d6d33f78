//! Token and frequency record definitions shared by rows and stores.
//!
//! Wire layout of a row (all integers little-endian, no padding):
//!
//! ```text
//! [total: u32][token 0: u32][count 0: u32][token 1: u32][count 1: u32] ...
//! ```
//!
//! Records are sorted strictly ascending by token.

/// Identifier of a phrase or character in the vocabulary.
pub type Token = u32;

/// Size of the aggregate counter at the front of a row.
pub const HEADER_SIZE: usize = 4;

/// Size of one `(token, count)` record.
pub const RECORD_SIZE: usize = 8;

/// Size of a store key.
pub const KEY_SIZE: usize = std::mem::size_of::<Token>();

/// One `(token, count)` pair of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FreqRecord {
    pub token: Token,
    pub count: u32,
}

impl FreqRecord {
    #[inline]
    pub fn new(token: Token, count: u32) -> Self {
        Self { token, count }
    }

    /// Encode into exactly one record unit.
    #[inline]
    pub fn encode(self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[..4].copy_from_slice(&self.token.to_le_bytes());
        out[4..].copy_from_slice(&self.count.to_le_bytes());
        out
    }

    /// Decode one record unit. `bytes` must be exactly `RECORD_SIZE` long;
    /// callers slice it out of a validated row.
    #[inline]
    pub(crate) fn decode(bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), RECORD_SIZE);
        Self {
            token: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// A successor token with its normalized frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BigramPhraseItem {
    pub token: Token,
    /// `count / total` of the row it came from.
    pub freq: f32,
}

/// A successor token with its raw count and normalized frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BigramPhraseItemWithCount {
    pub token: Token,
    pub count: u32,
    pub freq: f32,
}

/// Encode a token as a store key.
#[inline]
pub fn encode_key(token: Token) -> [u8; KEY_SIZE] {
    token.to_le_bytes()
}

/// Decode a store key, or `None` if it is not exactly `KEY_SIZE` bytes.
#[inline]
pub fn decode_key(key: &[u8]) -> Option<Token> {
    let bytes: [u8; KEY_SIZE] = key.try_into().ok()?;
    Some(Token::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let rec = FreqRecord::new(0x0403_0201, 0x0807_0605);
        assert_eq!(rec.encode(), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(FreqRecord::decode(&[1, 2, 3, 4, 5, 6, 7, 8]), rec);
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(encode_key(0x0000_0102), [2, 1, 0, 0]);
        assert_eq!(decode_key(&[2, 1, 0, 0]), Some(0x0102));
        assert_eq!(decode_key(&[2, 1, 0]), None);
        assert_eq!(decode_key(&[2, 1, 0, 0, 0]), None);
    }
}
