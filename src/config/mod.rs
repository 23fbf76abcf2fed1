use crate::classify::CorruptRecordPolicy;
use crate::output::Verbosity;
use crate::utils::hash::DEFAULT_MMAP_THRESHOLD;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Settings read from `.save/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where fingerprints are persisted
    #[serde(default)]
    pub store: StoreConfig,

    /// What the scan visits
    #[serde(default)]
    pub scan: ScanConfig,

    /// Classification behaviour
    #[serde(default)]
    pub classify: ClassifyConfig,

    /// Report rendering
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[store]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store directory; relative paths resolve against the working root
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Record a baseline for files the store has never seen
    #[serde(default = "default_record_new_files")]
    pub record_new_files: bool,
}

/// `[scan]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Directory names starting with any of these are not descended into
    #[serde(default = "default_ignored_prefixes")]
    pub ignored_prefixes: Vec<String>,
    /// Descend through symbolic links
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Apply the ignored prefixes to file names as well
    #[serde(default)]
    pub skip_matching_files: bool,
    /// Files at or above this many bytes are memory-mapped for hashing
    #[serde(default = "default_mmap_threshold")]
    pub mmap_threshold: u64,
}

/// `[classify]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// Handling of stored values that do not decode
    #[serde(default)]
    pub on_corrupt_record: CorruptRecordPolicy,
}

/// `[output]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// How much of the report to print
    #[serde(default)]
    pub verbosity: Verbosity,
    /// List every hit, not just the count
    #[serde(default = "default_show_hits")]
    pub show_hits: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            record_new_files: default_record_new_files(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignored_prefixes: default_ignored_prefixes(),
            follow_symlinks: false,
            skip_matching_files: false,
            mmap_threshold: default_mmap_threshold(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            show_hits: default_show_hits(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// A missing file yields the defaults, which are written to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid TOML
    /// - The configuration fails validation
    /// - The default configuration cannot be written
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or fails validation.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create config file: {}", path.display()))?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }

    /// Check values that parse but cannot work
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.store.path.as_os_str().is_empty() {
            anyhow::bail!("store.path cannot be empty");
        }

        if self.scan.ignored_prefixes.iter().any(String::is_empty) {
            anyhow::bail!("scan.ignored_prefixes cannot contain an empty prefix");
        }

        if self.scan.mmap_threshold == 0 {
            anyhow::bail!("scan.mmap_threshold must be at least 1");
        }

        Ok(())
    }

    /// Store directory resolved against `root`
    #[must_use]
    pub fn store_dir(&self, root: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            root.join(&self.store.path)
        }
    }
}

// Default functions for serde
/// Default `store.path`
fn default_store_path() -> PathBuf {
    PathBuf::from(crate::DEFAULT_STORE_PATH)
}

/// Default `store.record_new_files`
const fn default_record_new_files() -> bool {
    true
}

/// Default `scan.ignored_prefixes`
fn default_ignored_prefixes() -> Vec<String> {
    vec![".".to_string()]
}

/// Default `scan.mmap_threshold`
const fn default_mmap_threshold() -> u64 {
    DEFAULT_MMAP_THRESHOLD
}

/// Default `output.show_hits`
const fn default_show_hits() -> bool {
    true
}
