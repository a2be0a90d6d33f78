//! Encoding helpers for the value region of a database file.
//!
//! Values are stored back to back as length-prefixed byte strings, where the
//! length is a LEB128-style variable-length integer. Decoding never panics on
//! truncated input: every read is bounds-checked and reports `None`.

/// Maximum number of bytes a `u64` varint can occupy.
pub const MAX_VARINT_LEN: usize = 10;

/// Encode a u64 as a variable-length integer.
///
/// Uses 1-10 bytes depending on the value:
/// - 0-127: 1 byte
/// - 128-16383: 2 bytes
/// - etc.
pub fn encode_varint(mut value: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut i = 0;
    while value >= 0x80 {
        buf[i] = (value as u8) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    i + 1
}

/// Decode a variable-length integer from the front of `buf`.
///
/// Returns `(value, bytes_consumed)`, or `None` if the input ends in the
/// middle of the integer or the integer overflows 64 bits.
pub fn decode_varint(buf: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;

    for (i, &byte) in buf.iter().enumerate().take(MAX_VARINT_LEN) {
        let low = u64::from(byte & 0x7F);
        if shift == 63 && low > 1 {
            return None;
        }
        value |= low << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
        shift += 7;
    }
    None
}

/// Append a length-prefixed byte slice to `buf`.
pub fn encode_bytes(data: &[u8], buf: &mut Vec<u8>) {
    let mut len_buf = [0u8; MAX_VARINT_LEN];
    let len_size = encode_varint(data.len() as u64, &mut len_buf);
    buf.extend_from_slice(&len_buf[..len_size]);
    buf.extend_from_slice(data);
}

/// Decode a length-prefixed byte slice.
///
/// Returns `(data, bytes_consumed)`, or `None` if the prefix or the payload
/// runs past the end of `buf`.
pub fn decode_bytes(buf: &[u8]) -> Option<(&[u8], usize)> {
    let (len, len_size) = decode_varint(buf)?;
    let len = usize::try_from(len).ok()?;
    let end = len_size.checked_add(len)?;
    let data = buf.get(len_size..end)?;
    Some((data, end))
}
