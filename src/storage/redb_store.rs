//! Durable fingerprint store.
//!
//! The store is a directory containing a single redb database file. redb
//! takes an exclusive lock on the file, so a second handle (from this or any
//! other process) fails to open until the first one is dropped.

use super::FingerprintStore;
use anyhow::{Context, Result};
use redb::{Database, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Table holding encoded fingerprints keyed by path
const FINGERPRINTS: TableDefinition<'_, &str, &[u8]> = TableDefinition::new("fingerprints");

/// Database file name inside the store directory
pub const DB_FILE: &str = "fingerprints.redb";

/// Fingerprint store persisted on disk with redb.
pub struct RedbStore {
    /// Open database handle, released on drop
    db: Database,
    /// Store directory (for error messages)
    dir: PathBuf,
}

impl RedbStore {
    /// Opens the store in `dir`, creating the directory and database if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory cannot be created
    /// - The database is corrupt or already open elsewhere
    /// - The fingerprint table cannot be initialised
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;

        let db_path = dir.join(DB_FILE);
        let db = Database::create(&db_path)
            .with_context(|| format!("Failed to open store database: {}", db_path.display()))?;

        let txn = db.begin_write().context("Failed to begin store transaction")?;
        {
            txn.open_table(FINGERPRINTS)
                .context("Failed to create fingerprint table")?;
        }
        txn.commit().context("Failed to initialise store")?;

        debug!(store = %dir.display(), "opened fingerprint store");

        Ok(Self {
            db,
            dir: dir.to_path_buf(),
        })
    }

    /// Directory this store lives in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FingerprintStore for RedbStore {
    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let txn = self
            .db
            .begin_read()
            .with_context(|| format!("Failed to read store: {}", self.dir.display()))?;
        let table = txn
            .open_table(FINGERPRINTS)
            .context("Failed to open fingerprint table")?;
        let value = table
            .get(key)
            .with_context(|| format!("Failed to look up key: {key}"))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let txn = self
            .db
            .begin_write()
            .with_context(|| format!("Failed to write store: {}", self.dir.display()))?;
        {
            let mut table = txn
                .open_table(FINGERPRINTS)
                .context("Failed to open fingerprint table")?;
            table
                .insert(key, value)
                .with_context(|| format!("Failed to insert key: {key}"))?;
        }
        txn.commit()
            .with_context(|| format!("Failed to commit write for key: {key}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_directory() -> Result<()> {
        let temp = TempDir::new()?;
        let dir = temp.path().join(".save/level.db");

        let store = RedbStore::open(&dir)?;

        assert!(dir.is_dir());
        assert!(dir.join(DB_FILE).is_file());
        assert_eq!(store.dir(), dir.as_path());
        Ok(())
    }

    #[test]
    fn test_values_survive_reopen() -> Result<()> {
        let temp = TempDir::new()?;
        let dir = temp.path().join("store");

        {
            let mut store = RedbStore::open(&dir)?;
            store.put("a.txt", b"first")?;
            store.put("a.txt", b"second")?;
        }

        let store = RedbStore::open(&dir)?;
        assert!(store.has("a.txt")?);
        assert!(!store.has("b.txt")?);
        assert_eq!(store.get("a.txt")?, Some(b"second".to_vec()));
        Ok(())
    }

    #[test]
    fn test_second_open_fails_while_held() -> Result<()> {
        let temp = TempDir::new()?;
        let dir = temp.path().join("store");

        let _held = RedbStore::open(&dir)?;
        assert!(RedbStore::open(&dir).is_err());
        Ok(())
    }
}
