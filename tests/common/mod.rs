#![allow(dead_code)]

use anyhow::Result;
use filetime::FileTime;
use savecheck::SaveContext;
use savecheck::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway working tree with helpers for writing files at known times
pub struct TestTree {
    pub temp_dir: TempDir,
}

impl TestTree {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Root of the tree
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `content` to `rel`, creating parent directories
    pub fn write(&self, rel: &str, content: &str) -> Result<PathBuf> {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Writes `content` to `rel` and pins its mtime to `secs` since the epoch
    pub fn write_at(&self, rel: &str, content: &str, secs: i64) -> Result<PathBuf> {
        let path = self.write(rel, content)?;
        self.set_mtime(rel, secs)?;
        Ok(path)
    }

    pub fn set_mtime(&self, rel: &str, secs: i64) -> Result<()> {
        filetime::set_file_mtime(self.path().join(rel), FileTime::from_unix_time(secs, 0))?;
        Ok(())
    }

    /// Context rooted at this tree with `config`, touching no environment
    pub fn context(&self, config: Config) -> SaveContext {
        SaveContext::new_explicit(self.path().to_path_buf(), config)
    }
}

/// Seconds to nanoseconds, the unit fingerprints store
pub const fn nanos(secs: i64) -> i64 {
    secs * 1_000_000_000
}
