//! In-memory table backing writable databases.
//!
//! Keys are kept in a `BTreeMap`, so iteration is always in ascending
//! lexicographic key order, which is the order the file writer needs.
//! Short keys (up to 16 bytes) live inline in the map node.

use std::collections::BTreeMap;

use smallvec::SmallVec;

/// Inline key storage.
pub type Key = SmallVec<[u8; 16]>;

/// A sorted key-value table with owned byte-string values.
#[derive(Debug, Clone, Default)]
pub struct MemTable {
    map: BTreeMap<Key, Vec<u8>>,
}

impl MemTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Insert or overwrite a value. Returns the previous value.
    pub fn insert(&mut self, key: &[u8], value: Vec<u8>) -> Option<Vec<u8>> {
        self.map.insert(SmallVec::from_slice(key), value)
    }

    /// Get a reference to the value for a key.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.map.get(key).map(Vec::as_slice)
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.map.contains_key(key)
    }

    /// Remove a key.
    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        self.map.remove(key)
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over all entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.map.iter().map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_table() {
        let mut t = MemTable::new();

        assert_eq!(t.insert(b"hello", b"1".to_vec()), None);
        assert_eq!(t.insert(b"world", b"2".to_vec()), None);
        assert_eq!(t.insert(b"hello", b"3".to_vec()), Some(b"1".to_vec()));

        assert_eq!(t.get(b"hello"), Some(&b"3"[..]));
        assert_eq!(t.get(b"foo"), None);
        assert!(t.contains(b"world"));
        assert_eq!(t.len(), 2);

        assert_eq!(t.remove(b"hello"), Some(b"3".to_vec()));
        assert_eq!(t.get(b"hello"), None);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_iter_is_sorted() {
        let mut t = MemTable::new();
        t.insert(&[3, 0, 0, 0], vec![]);
        t.insert(&[1, 0, 0, 0], vec![]);
        t.insert(&[2, 1, 0, 0], vec![]);
        t.insert(&[2, 0, 0, 0], vec![]);

        let keys: Vec<Vec<u8>> = t.iter().map(|(k, _)| k.to_vec()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_long_keys_spill() {
        let mut t = MemTable::new();
        let long = vec![9u8; 40];
        t.insert(&long, b"v".to_vec());
        assert_eq!(t.get(&long), Some(&b"v"[..]));
        assert_eq!(t.len(), 1);
    }
}
