//! Chainstate value obfuscation.
//!
//! Core XORs every value in the chainstate with a random 8-byte key so that
//! on-disk data does not contain predictable byte patterns. The key lives in
//! the same database under a fixed record whose value is a serialized
//! `std::vector<unsigned char>`: one CompactSize length byte (8) followed by
//! the key bytes.

use crate::error::{DumpError, FormatError};
use crate::store::ChainstateStore;

/// Key of the obfuscation record: CompactSize(14) + "\0obfuscate_key".
pub const OBFUSCATE_KEY_KEY: &[u8] = b"\x0e\x00obfuscate_key";

pub const OBFUSCATE_KEY_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObfuscationKey {
    key: Vec<u8>,
}

impl ObfuscationKey {
    /// Parse the stored record (length tag + key bytes).
    pub fn from_record(record: &[u8]) -> Result<Self, FormatError> {
        match record.first() {
            Some(&tag) if tag as usize == OBFUSCATE_KEY_LEN && record.len() == OBFUSCATE_KEY_LEN + 1 => {
                Ok(ObfuscationKey { key: record[1..].to_vec() })
            }
            tag => Err(FormatError::InvalidObfuscationKey {
                tag: tag.copied().unwrap_or(0),
                len: record.len(),
            }),
        }
    }

    /// Build a key from raw bytes. An empty key leaves data untouched.
    pub fn from_bytes(key: impl Into<Vec<u8>>) -> Self {
        ObfuscationKey { key: key.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// XOR `data` with the repeating key, in place. Applying it twice
    /// restores the input.
    pub fn apply(&self, data: &mut [u8]) {
        if self.key.is_empty() {
            return;
        }
        for (byte, k) in data.iter_mut().zip(self.key.iter().cycle()) {
            *byte ^= k;
        }
    }
}

/// Read and validate the obfuscation key from the store.
pub fn load_obfuscation_key<S: ChainstateStore + ?Sized>(store: &mut S) -> Result<ObfuscationKey, DumpError> {
    let record = store
        .get(OBFUSCATE_KEY_KEY)?
        .ok_or(FormatError::MissingObfuscationKey)?;
    let key = ObfuscationKey::from_record(&record)?;
    tracing::debug!(key = %hex::encode(key.as_bytes()), "Loaded chainstate obfuscation key");
    Ok(key)
}
