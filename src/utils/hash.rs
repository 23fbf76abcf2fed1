use anyhow::{Context, Result};
use memmap2::MmapOptions;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Files at or above this size are hashed through a memory map by default
pub const DEFAULT_MMAP_THRESHOLD: u64 = 1_048_576;

/// SHA-256 of `data` as lowercase hex.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// SHA-256 of the complete contents of the file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn hash_file(path: &Path) -> Result<String> {
    hash_file_with_threshold(path, DEFAULT_MMAP_THRESHOLD)
}

/// Hashes a file, memory-mapping it when it is at least `mmap_threshold` bytes.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, mapped or read.
pub fn hash_file_with_threshold(path: &Path, mmap_threshold: u64) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("Failed to get metadata for: {}", path.display()))?
        .len();

    if len == 0 {
        return Ok(hash_bytes(b""));
    }

    if len < mmap_threshold {
        hash_reader(file).with_context(|| format!("Failed to read file: {}", path.display()))
    } else {
        // SAFETY: read-only map, dropped before returning
        let mmap = unsafe { MmapOptions::new().map(&file) }
            .with_context(|| format!("Failed to map file: {}", path.display()))?;
        Ok(hash_bytes(&mmap))
    }
}

/// Streams `reader` through SHA-256 in 64 KiB chunks.
fn hash_reader(mut reader: impl Read) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 65536];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
