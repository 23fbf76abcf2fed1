/// In-memory store for tests and embedding
pub mod memory;
/// Durable store backed by redb
pub mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::fingerprint::FileFingerprint;
use crate::utils::serialization;
use anyhow::{Context, Result};

/// Key-value persistence for fingerprints, keyed by path.
///
/// Values are opaque bytes produced by [`encode_record`]. Implementations
/// only have to be durable across runs; callers never hold more than one
/// handle to the same store.
pub trait FingerprintStore {
    /// Whether a value is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn has(&self, key: &str) -> Result<bool>;

    /// The value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be durably written.
    fn put(&mut self, key: &str, value: &[u8]) -> Result<()>;
}

/// Encodes a fingerprint into its persisted form.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_record(record: &FileFingerprint) -> Result<Vec<u8>> {
    serialization::serialize(record)
        .with_context(|| format!("Failed to encode record for {}", record.path))
}

/// Decodes a persisted fingerprint.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid encoded record.
pub fn decode_record(bytes: &[u8]) -> Result<FileFingerprint> {
    serialization::deserialize(bytes).context("Failed to decode stored fingerprint")
}

/// Encodes `record` and writes it under its own path.
///
/// # Errors
///
/// Returns an error if encoding or the store write fails.
pub fn persist<S: FingerprintStore + ?Sized>(store: &mut S, record: &FileFingerprint) -> Result<()> {
    let value = encode_record(record)?;
    store
        .put(record.key(), &value)
        .with_context(|| format!("Failed to write store entry for {}", record.path))
}

/// Reads and decodes the record under `key`, if present.
///
/// # Errors
///
/// Returns an error if the store cannot be read or the value does not decode.
pub fn load<S: FingerprintStore + ?Sized>(store: &S, key: &str) -> Result<Option<FileFingerprint>> {
    store.get(key)?.map(|bytes| decode_record(&bytes)).transpose()
}
