//! Read-only view of a chainstate key/value store.
//!
//! The codec only needs two capabilities: exact-key lookup (for the
//! obfuscation key) and ordered iteration over a half-open key range (for the
//! coin records). LevelDB is the real backend; the `BTreeMap` implementation
//! below has the same bytewise ordering and is what the unit tests drive.

use std::collections::BTreeMap;

use crate::error::DumpError;

/// A raw `(key, value)` pair exactly as stored.
pub type ChainstateRawEntry = (Vec<u8>, Vec<u8>);

/// Iterator over raw entries. Store failures surface per item.
pub type RawEntryIter<'a> = Box<dyn Iterator<Item = Result<ChainstateRawEntry, DumpError>> + 'a>;

pub trait ChainstateStore {
    /// Exact-key lookup.
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, DumpError>;

    /// Entries with `start <= key < end`, in ascending bytewise key order.
    fn range<'a>(&'a mut self, start: &[u8], end: &[u8]) -> Result<RawEntryIter<'a>, DumpError>;
}

impl ChainstateStore for BTreeMap<Vec<u8>, Vec<u8>> {
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, DumpError> {
        Ok(BTreeMap::get(self, key).cloned())
    }

    fn range<'a>(&'a mut self, start: &[u8], end: &[u8]) -> Result<RawEntryIter<'a>, DumpError> {
        if start >= end {
            return Ok(Box::new(std::iter::empty()));
        }
        let iter = BTreeMap::range(self, start.to_vec()..end.to_vec())
            .map(|(k, v)| Ok((k.clone(), v.clone())));
        Ok(Box::new(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BTreeMap<Vec<u8>, Vec<u8>> {
        let mut map = BTreeMap::new();
        map.insert(b"B\xff".to_vec(), vec![1]);
        map.insert(b"C".to_vec(), vec![2]);
        map.insert(b"C\x00\x01".to_vec(), vec![3]);
        map.insert(b"C\xff\xff".to_vec(), vec![4]);
        map.insert(b"D".to_vec(), vec![5]);
        map
    }

    #[test]
    fn test_range_is_half_open() {
        let mut map = sample();
        let values: Vec<u8> = ChainstateStore::range(&mut map, b"C", b"D")
            .unwrap()
            .map(|e| e.unwrap().1[0])
            .collect();
        assert_eq!(values, vec![2, 3, 4]);
    }

    #[test]
    fn test_empty_or_inverted_range() {
        let mut map = sample();
        assert_eq!(ChainstateStore::range(&mut map, b"D", b"C").unwrap().count(), 0);
        assert_eq!(ChainstateStore::range(&mut map, b"C", b"C").unwrap().count(), 0);
    }

    #[test]
    fn test_get() {
        let mut map = sample();
        assert_eq!(ChainstateStore::get(&mut map, b"D").unwrap(), Some(vec![5]));
        assert_eq!(ChainstateStore::get(&mut map, b"E").unwrap(), None);
    }
}
