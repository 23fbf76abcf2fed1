//! The fingerprint record: one file's observed state at a point in time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A `(path, checksum, mod_time)` triple describing one file.
///
/// The same shape is used for freshly scanned files and for records read
/// back out of the store. Within a single scan `path` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileFingerprint {
    /// Path relative to the scan root, `/`-separated. Also the store key.
    pub path: String,
    /// Lowercase hex SHA-256 of the file contents at read time
    pub checksum: String,
    /// Modification time in nanoseconds since the Unix epoch
    pub mod_time: i64,
}

impl FileFingerprint {
    /// Builds a record from its parts.
    #[must_use]
    pub fn new(path: impl Into<String>, checksum: impl Into<String>, mod_time: i64) -> Self {
        Self {
            path: path.into(),
            checksum: checksum.into(),
            mod_time,
        }
    }

    /// Store key for this record.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.path
    }
}

/// Converts a filesystem timestamp to signed nanoseconds since the epoch.
///
/// Timestamps before 1970 come out negative.
///
/// # Errors
///
/// Returns an error if the timestamp does not fit in an `i64` of nanoseconds.
pub fn mtime_nanos(time: SystemTime) -> Result<i64> {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).context("Modification time too large"),
        Err(before) => i64::try_from(before.duration().as_nanos())
            .map(|n| -n)
            .context("Modification time too far before the epoch"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_mtime_nanos_after_epoch() -> Result<()> {
        let t = UNIX_EPOCH + Duration::new(1_700_000_000, 123);
        assert_eq!(mtime_nanos(t)?, 1_700_000_000_000_000_123);
        Ok(())
    }

    #[test]
    fn test_mtime_nanos_before_epoch() -> Result<()> {
        let t = UNIX_EPOCH - Duration::from_secs(2);
        assert_eq!(mtime_nanos(t)?, -2_000_000_000);
        Ok(())
    }

    #[test]
    fn test_key_is_path() {
        let fp = FileFingerprint::new("dir/a.txt", "ab", 1);
        assert_eq!(fp.key(), "dir/a.txt");
    }
}
