use super::FingerprintStore;
use anyhow::Result;
use std::collections::{BTreeMap, HashSet};

/// A `BTreeMap`-backed store that lives only as long as the process.
///
/// Keys listed in the failure set make `has`/`get`/`put` return an I/O-style
/// error, which lets callers exercise per-file error handling.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    /// Encoded records by key
    entries: BTreeMap<String, Vec<u8>>,
    /// Keys whose operations fail
    failing_keys: HashSet<String>,
}

impl MemoryStore {
    /// Empty store with no failing keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation on `key` fail from now on.
    pub fn fail_on(&mut self, key: impl Into<String>) {
        self.failing_keys.insert(key.into());
    }

    /// Stores raw bytes, bypassing the failure set.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.entries.insert(key.into(), value);
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fails if `key` is in the failure set.
    fn check(&self, key: &str) -> Result<()> {
        if self.failing_keys.contains(key) {
            anyhow::bail!("Simulated I/O error for key: {key}");
        }
        Ok(())
    }
}

impl FingerprintStore for MemoryStore {
    fn has(&self, key: &str) -> Result<bool> {
        self.check(key)?;
        Ok(self.entries.contains_key(key))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check(key)?;
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.check(key)?;
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
