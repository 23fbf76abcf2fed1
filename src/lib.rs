#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Simple counters cannot overflow
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # Savecheck - file change detection against a persisted baseline
//!
//! Savecheck hashes every file in a directory tree and compares the result
//! with the fingerprints recorded by a previous run. Every file is reported
//! as exactly one of:
//!
//! - **hit**: content unchanged (or never seen before)
//! - **miss**: content changed, split by which side has the newer timestamp
//!   - *need update*: the file is newer, so the store is updated to match
//!   - *time regression*: the stored record is newer than the file on disk,
//!     which is reported and left alone
//! - **error**: the stored baseline could not be read
//!
//! ## Architecture
//!
//! - [`scanner`]: walks the tree and produces [`fingerprint::FileFingerprint`]s
//! - [`storage`]: the [`storage::FingerprintStore`] trait with a durable
//!   redb-backed implementation and an in-memory one
//! - [`classify`]: the comparison engine
//! - [`commands`]: orchestration of one run
//! - [`output`]: report rendering
//! - [`config`]: TOML configuration
//!
//! ## Example Usage
//!
//! ```
//! use savecheck::classify::{Classifier, MissReason};
//! use savecheck::fingerprint::FileFingerprint;
//! use savecheck::storage::{MemoryStore, persist};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut store = MemoryStore::new();
//! persist(&mut store, &FileFingerprint::new("a.txt", "x", 100))?;
//!
//! let result = Classifier::new(&store).classify(vec![FileFingerprint::new("a.txt", "y", 200)]);
//! assert_eq!(result.misses[0].reason(), MissReason::PassedNewer);
//! # Ok(())
//! # }
//! ```

/// Command-line interface definition (argument parsing structures).
pub mod cli;

/// Fingerprint comparison and outcome types.
pub mod classify;

/// Command implementations.
pub mod commands;

/// Configuration parsing, validation, and defaults.
pub mod config;

/// The fingerprint record.
pub mod fingerprint;

/// Report rendering.
pub mod output;

/// Directory traversal producing fingerprints.
pub mod scanner;

/// Fingerprint persistence.
pub mod storage;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Current version of the savecheck binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store directory relative to the working root.
pub const DEFAULT_STORE_PATH: &str = ".save/level.db";

/// Default configuration file path relative to the working root.
pub const DEFAULT_CONFIG_PATH: &str = ".save/config.toml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "SAVECHECK_CONFIG_PATH";

/// Environment variable overriding the store directory.
pub const STORE_PATH_ENV: &str = "SAVECHECK_STORE_PATH";

/// Resolved locations and settings for one run.
#[derive(Debug, Clone)]
pub struct SaveContext {
    /// Directory being checked; store keys are relative to it.
    pub root: PathBuf,

    /// Directory holding the fingerprint store.
    pub store_path: PathBuf,

    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl SaveContext {
    /// Creates a context rooted at the process working directory.
    ///
    /// # Errors
    /// Returns an error if the working directory cannot be determined or the
    /// configuration cannot be loaded.
    pub fn from_current_dir() -> Result<Self> {
        let root = std::env::current_dir().context("Cannot get working directory")?;
        Self::new(root)
    }

    /// Creates a context rooted at `root`, honouring the environment overrides.
    ///
    /// # Errors
    /// Returns an error if the configuration file cannot be read, parsed,
    /// validated, or (when missing) created.
    pub fn new(root: PathBuf) -> Result<Self> {
        let config_path = std::env::var_os(CONFIG_PATH_ENV).map_or_else(
            || root.join(DEFAULT_CONFIG_PATH),
            |p| resolve_against(&root, Path::new(&p)),
        );

        let config = config::Config::load(&config_path)?;

        let store_path = std::env::var_os(STORE_PATH_ENV).map_or_else(
            || config.store_dir(&root),
            |p| resolve_against(&root, Path::new(&p)),
        );

        Ok(Self {
            root,
            store_path,
            config_path,
            config,
        })
    }

    /// Creates a context from an already loaded configuration.
    /// This avoids the need for environment variable manipulation.
    #[must_use]
    pub fn new_explicit(root: PathBuf, config: config::Config) -> Self {
        let store_path = config.store_dir(&root);
        let config_path = root.join(DEFAULT_CONFIG_PATH);
        Self {
            root,
            store_path,
            config_path,
            config,
        }
    }

    /// Scan options from the config, with the store and config file pruned.
    #[must_use]
    pub fn scan_options(&self) -> scanner::ScanOptions {
        scanner::ScanOptions {
            excluded_paths: vec![self.store_path.clone(), self.config_path.clone()],
            ..scanner::ScanOptions::from(&self.config.scan)
        }
    }
}

/// `path` unchanged if absolute, otherwise joined onto `root`.
fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
