//! Utility functions and helpers.
//!
//! - Prefix matching for ignored directory names
//! - Converting scanned paths into store keys
//! - Timestamp rendering
//!
//! # Submodules
//!
//! - [`hash`]: SHA-256 file hashing
//! - [`serialization`]: Binary serialization of stored records

/// SHA-256 content hashing
pub mod hash;
/// Binary serialization utilities
pub mod serialization;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::ffi::OsStr;
use std::path::{Component, Path};

/// Whether `name` starts with any of `prefixes`.
///
/// Names that are not valid UTF-8 are compared lossily.
#[must_use]
pub fn has_ignored_prefix(name: &OsStr, prefixes: &[String]) -> bool {
    let name = name.to_string_lossy();
    prefixes.iter().any(|prefix| name.starts_with(prefix.as_str()))
}

/// Turns a scanned path into its store key.
///
/// The key is `path` relative to `root`, with normal components joined by
/// `/` on every platform.
///
/// # Errors
///
/// Returns an error if `path` is not under `root`, or contains a component
/// that is not valid UTF-8.
pub fn path_key(path: &Path, root: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        anyhow::anyhow!(
            "Path {} is outside scan root {}",
            path.display(),
            root.display()
        )
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| {
                    anyhow::anyhow!("Path is not valid UTF-8: {}", path.display())
                })?;
                parts.push(part);
            }
            Component::CurDir => {}
            other => anyhow::bail!(
                "Unexpected component {:?} in path: {}",
                other.as_os_str(),
                path.display()
            ),
        }
    }

    if parts.is_empty() {
        anyhow::bail!("Path {} is the scan root itself", path.display());
    }
    Ok(parts.join("/"))
}

/// Renders nanoseconds since the epoch as an RFC 3339 UTC timestamp.
#[must_use]
pub fn format_timestamp(nanos: i64) -> String {
    DateTime::<Utc>::from_timestamp_nanos(nanos).to_rfc3339_opts(SecondsFormat::Nanos, true)
}
