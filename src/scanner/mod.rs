//! Directory scanner producing fingerprints for every regular file in a tree.
//!
//! Traversal is depth-first with entries visited in file-name order.
//! Directories whose name starts with an ignored prefix are not descended
//! into. Failures on individual entries are collected next to the successful
//! fingerprints instead of aborting the scan; only a failure on the root
//! itself is fatal.

use crate::config::ScanConfig;
use crate::fingerprint::{FileFingerprint, mtime_nanos};
use crate::utils::hash::{DEFAULT_MMAP_THRESHOLD, hash_file_with_threshold};
use crate::utils::{has_ignored_prefix, path_key};
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Options controlling what a scan visits.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directory names starting with any of these are skipped entirely
    pub ignored_prefixes: Vec<String>,
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Also skip regular files whose name starts with an ignored prefix
    pub skip_matching_files: bool,
    /// Files at or above this size are hashed through a memory map
    pub mmap_threshold: u64,
    /// Paths pruned regardless of name, such as the store itself
    pub excluded_paths: Vec<PathBuf>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            ignored_prefixes: vec![".".to_string()],
            follow_symlinks: false,
            skip_matching_files: false,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
            excluded_paths: Vec::new(),
        }
    }
}

impl From<&ScanConfig> for ScanOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            ignored_prefixes: config.ignored_prefixes.clone(),
            follow_symlinks: config.follow_symlinks,
            skip_matching_files: config.skip_matching_files,
            mmap_threshold: config.mmap_threshold,
            excluded_paths: Vec::new(),
        }
    }
}

/// A file or directory that could not be fingerprinted.
#[derive(Debug)]
pub struct ScanError {
    /// Path of the entry that failed
    pub path: PathBuf,
    /// Underlying cause
    pub source: anyhow::Error,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#}", self.path.display(), self.source)
    }
}

impl std::error::Error for ScanError {}

/// Result of scanning a tree.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Fingerprints in traversal order, unique by path
    pub fingerprints: Vec<FileFingerprint>,
    /// Entries that could not be read or hashed
    pub errors: Vec<ScanError>,
}

/// Scans `root` with default options and the given ignored prefixes.
///
/// # Errors
///
/// Returns an error if `root` is not a readable directory.
pub fn scan(root: &Path, ignored_prefixes: &[String]) -> Result<ScanReport> {
    let options = ScanOptions {
        ignored_prefixes: ignored_prefixes.to_vec(),
        ..ScanOptions::default()
    };
    Scanner::new(root.to_path_buf(), options).scan()
}

/// Fingerprint producer for one directory tree.
pub struct Scanner {
    /// Traversal root; keys are relative to it
    root: PathBuf,
    /// What to visit and how to hash
    options: ScanOptions,
}

impl Scanner {
    /// Scanner for the tree under `root`.
    #[must_use]
    pub const fn new(root: PathBuf, options: ScanOptions) -> Self {
        Self { root, options }
    }

    /// Walks the tree and fingerprints every regular file.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is missing, not a directory, or cannot be
    /// listed. Failures below the root are reported in [`ScanReport::errors`].
    pub fn scan(&self) -> Result<ScanReport> {
        let metadata = std::fs::metadata(&self.root)
            .with_context(|| format!("Cannot access scan root: {}", self.root.display()))?;
        if !metadata.is_dir() {
            anyhow::bail!("Scan root is not a directory: {}", self.root.display());
        }

        let mut report = ScanReport::default();

        for entry in WalkDir::new(&self.root)
            .follow_links(self.options.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.should_skip_entry(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(err).with_context(|| {
                        format!("Failed to read scan root: {}", self.root.display())
                    });
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    warn!(path = %path.display(), "skipping unreadable entry");
                    report.errors.push(ScanError {
                        path,
                        source: err.into(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                if entry.path_is_symlink() {
                    debug!(path = %entry.path().display(), "skipping symlink");
                }
                continue;
            }

            match self.fingerprint_entry(&entry) {
                Ok(fingerprint) => {
                    debug!(
                        path = %fingerprint.path,
                        checksum = %fingerprint.checksum,
                        mod_time = fingerprint.mod_time,
                        "fingerprinted"
                    );
                    report.fingerprints.push(fingerprint);
                }
                Err(source) => {
                    warn!(path = %entry.path().display(), "failed to fingerprint file");
                    report.errors.push(ScanError {
                        path: entry.path().to_path_buf(),
                        source,
                    });
                }
            }
        }

        Ok(report)
    }

    /// Check if a directory entry should be skipped
    fn should_skip_entry(&self, entry: &DirEntry) -> bool {
        // The root is always visited, even when its own name matches
        if entry.depth() == 0 {
            return false;
        }

        if self.options.excluded_paths.iter().any(|p| entry.path() == p) {
            debug!(path = %entry.path().display(), "skipping excluded path");
            return true;
        }

        let matches = has_ignored_prefix(entry.file_name(), &self.options.ignored_prefixes);
        if entry.file_type().is_dir() {
            matches
        } else {
            matches && self.options.skip_matching_files
        }
    }

    /// Key, mtime and checksum for one regular file.
    fn fingerprint_entry(&self, entry: &DirEntry) -> Result<FileFingerprint> {
        let path = entry.path();
        let key = path_key(path, &self.root)?;

        let modified = entry
            .metadata()
            .with_context(|| format!("Failed to get metadata for: {}", path.display()))?
            .modified()
            .context("Failed to get file modification time")?;
        let mod_time = mtime_nanos(modified)?;

        let checksum = hash_file_with_threshold(path, self.options.mmap_threshold)?;

        Ok(FileFingerprint {
            path: key,
            checksum,
            mod_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash::hash_bytes;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_structure(root: &Path) -> Result<()> {
        // root/
        //   b.txt
        //   a/
        //     z.txt
        //     inner/
        //       y.txt
        //   .save/
        //     level.db/
        //       data
        //   .env
        fs::create_dir_all(root.join("a/inner"))?;
        fs::create_dir_all(root.join(".save/level.db"))?;
        fs::write(root.join("b.txt"), "bee")?;
        fs::write(root.join("a/z.txt"), "zed")?;
        fs::write(root.join("a/inner/y.txt"), "why")?;
        fs::write(root.join(".save/level.db/data"), "store")?;
        fs::write(root.join(".env"), "SECRET=1")?;
        Ok(())
    }

    fn paths(report: &ScanReport) -> Vec<&str> {
        report
            .fingerprints
            .iter()
            .map(|f| f.path.as_str())
            .collect()
    }

    #[test]
    fn test_scan_skips_ignored_directories() -> Result<()> {
        let temp = TempDir::new()?;
        create_test_structure(temp.path())?;

        let report = scan(temp.path(), &[".".to_string()])?;

        assert!(report.errors.is_empty());
        assert_eq!(paths(&report), vec![".env", "a/inner/y.txt", "a/z.txt", "b.txt"]);
        Ok(())
    }

    #[test]
    fn test_scan_records_checksum_and_mtime() -> Result<()> {
        let temp = TempDir::new()?;
        create_test_structure(temp.path())?;

        let report = scan(temp.path(), &[".".to_string()])?;
        let b = report
            .fingerprints
            .iter()
            .find(|f| f.path == "b.txt")
            .expect("b.txt scanned");

        let modified = fs::metadata(temp.path().join("b.txt"))?.modified()?;
        assert_eq!(b.checksum, hash_bytes(b"bee"));
        assert_eq!(b.mod_time, mtime_nanos(modified)?);
        Ok(())
    }

    #[test]
    fn test_scan_skip_matching_files() -> Result<()> {
        let temp = TempDir::new()?;
        create_test_structure(temp.path())?;

        let options = ScanOptions {
            skip_matching_files: true,
            ..ScanOptions::default()
        };
        let report = Scanner::new(temp.path().to_path_buf(), options).scan()?;

        assert_eq!(paths(&report), vec!["a/inner/y.txt", "a/z.txt", "b.txt"]);
        Ok(())
    }

    #[test]
    fn test_scan_prunes_excluded_paths() -> Result<()> {
        let temp = TempDir::new()?;
        create_test_structure(temp.path())?;
        fs::create_dir_all(temp.path().join("state"))?;
        fs::write(temp.path().join("state/fingerprints.redb"), "db")?;

        let options = ScanOptions {
            excluded_paths: vec![temp.path().join("state"), temp.path().join("b.txt")],
            ..ScanOptions::default()
        };
        let report = Scanner::new(temp.path().to_path_buf(), options).scan()?;

        assert_eq!(paths(&report), vec!["a/inner/y.txt", "a/z.txt"]);
        Ok(())
    }

    #[test]
    fn test_scan_without_prefixes_descends_everywhere() -> Result<()> {
        let temp = TempDir::new()?;
        create_test_structure(temp.path())?;

        let report = scan(temp.path(), &[])?;

        assert!(paths(&report).contains(&".save/level.db/data"));
        assert_eq!(report.fingerprints.len(), 5);
        Ok(())
    }

    #[test]
    fn test_root_with_ignored_name_is_still_scanned() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path().join(".hidden-root");
        fs::create_dir_all(&root)?;
        fs::write(root.join("file.txt"), "x")?;

        let report = scan(&root, &[".".to_string()])?;
        assert_eq!(paths(&report), vec!["file.txt"]);
        Ok(())
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        assert!(scan(&temp.path().join("missing"), &[]).is_err());
    }

    #[test]
    fn test_file_root_is_fatal() -> Result<()> {
        let temp = TempDir::new()?;
        let file = temp.path().join("file.txt");
        fs::write(&file, "x")?;
        assert!(scan(&file, &[]).is_err());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_entry_does_not_abort_scan() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join("good.txt"), "ok")?;
        std::os::unix::fs::symlink(temp.path().join("nowhere"), temp.path().join("dangling"))?;

        let options = ScanOptions {
            follow_symlinks: true,
            ..ScanOptions::default()
        };
        let report = Scanner::new(temp.path().to_path_buf(), options).scan()?;

        assert_eq!(paths(&report), vec!["good.txt"]);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].path.ends_with("dangling"));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_followed_by_default() -> Result<()> {
        let temp = TempDir::new()?;
        fs::write(temp.path().join("target.txt"), "t")?;
        std::os::unix::fs::symlink(temp.path().join("target.txt"), temp.path().join("link"))?;

        let report = scan(temp.path(), &[])?;
        assert_eq!(paths(&report), vec!["target.txt"]);
        assert!(report.errors.is_empty());
        Ok(())
    }
}
