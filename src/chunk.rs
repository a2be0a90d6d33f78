//! Growable byte buffer with splice-style insert and remove.

/// A contiguous, owned byte region.
///
/// Offsets passed to the splice methods must lie within `0..=len()`; the
/// read/write helpers require the full field to be in bounds. Violations are
/// programming errors and panic through slice indexing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    data: Vec<u8>,
}

impl Chunk {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Wrap existing bytes without copying.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Grow (zero-filled) or shrink to exactly `size` bytes.
    pub fn set_size(&mut self, size: usize) {
        self.data.resize(size, 0);
    }

    /// Insert `bytes` so that they start at `offset`, shifting the tail up.
    pub fn insert_content(&mut self, offset: usize, bytes: &[u8]) {
        debug_assert!(offset <= self.data.len());
        self.data.splice(offset..offset, bytes.iter().copied());
    }

    /// Remove `len` bytes starting at `offset`, shifting the tail down.
    pub fn remove_content(&mut self, offset: usize, len: usize) {
        debug_assert!(offset + len <= self.data.len());
        self.data.drain(offset..offset + len);
    }

    #[inline]
    pub fn read_u32_le(&self, at: usize) -> u32 {
        u32::from_le_bytes([
            self.data[at],
            self.data[at + 1],
            self.data[at + 2],
            self.data[at + 3],
        ])
    }

    #[inline]
    pub fn write_u32_le(&mut self, at: usize, v: u32) {
        self.data[at..at + 4].copy_from_slice(&v.to_le_bytes());
    }

    pub fn shrink_to_fit(&mut self) {
        self.data.shrink_to_fit();
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Chunk({} bytes)", self.data.len())
    }
}
