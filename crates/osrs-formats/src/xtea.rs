//! XTEA key store
//!
//! Each published cache ships a `keys.json` array mapping map squares to the
//! 128-bit keys that encrypt their location archives:
//!
//! ```json
//! [{"mapsquare": 12850, "key": [-1920480496, -1423914110, 951774544, -1419269290]}]
//! ```
//!
//! Key words are signed in the published JSON; they are stored here as the
//! equivalent unsigned 32-bit words. Decryption itself is not performed by
//! this crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::FormatResult;

/// A 128-bit XTEA key as four 32-bit words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct XteaKey(pub [u32; 4]);

impl XteaKey {
    /// Whether this is the all-zero key (unencrypted archive)
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }
}

impl<'de> Deserialize<'de> for XteaKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Accept both signed and unsigned spellings of each word
        let words = <[i64; 4]>::deserialize(deserializer)?;
        Ok(Self(words.map(|word| word as u32)))
    }
}

#[derive(Debug, Deserialize)]
struct KeyEntry {
    mapsquare: u32,
    key: XteaKey,
}

/// Map-square keyed XTEA key lookup
#[derive(Debug, Clone, Default)]
pub struct XteaKeyManager {
    keys: HashMap<u32, XteaKey>,
}

impl XteaKeyManager {
    /// Create an empty key store
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `keys.json` document
    ///
    /// Unknown fields (archive, group, name, name hash) are ignored. When a
    /// map square appears twice the later entry wins.
    pub fn from_json(json: &[u8]) -> FormatResult<Self> {
        let entries: Vec<KeyEntry> = serde_json::from_slice(json)?;
        let keys = entries
            .into_iter()
            .map(|entry| (entry.mapsquare, entry.key))
            .collect();
        Ok(Self { keys })
    }

    /// Add or replace the key of a map square
    pub fn insert(&mut self, mapsquare: u32, key: XteaKey) {
        self.keys.insert(mapsquare, key);
    }

    /// Key for a map square
    pub fn get(&self, mapsquare: u32) -> Option<XteaKey> {
        self.keys.get(&mapsquare).copied()
    }

    /// Key for the map square containing region coordinates `(x, y)`
    pub fn get_region(&self, x: u32, y: u32) -> Option<XteaKey> {
        self.get((x << 8) | y)
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
