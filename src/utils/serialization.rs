use anyhow::Result;

/// Bincode configuration for stored records.
fn get_config() -> impl bincode::config::Config {
    // Upper bound on one decoded record
    bincode::config::legacy().with_limit::<{ 1024 * 1024 }>()
}

/// Serialize data using bincode v2.0 with serde
///
/// # Errors
///
/// Returns an error if serialization fails
pub fn serialize<T: serde::Serialize>(data: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(data, get_config()).map_err(Into::into)
}

/// Deserialize data using bincode v2.0 with serde
///
/// Trailing bytes after a complete value are rejected.
///
/// # Errors
///
/// Returns an error if:
/// - Deserialization fails
/// - Data is malformed, truncated, or followed by trailing bytes
pub fn deserialize<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (result, bytes_read) = bincode::serde::decode_from_slice(bytes, get_config())?;
    if bytes_read != bytes.len() {
        anyhow::bail!(
            "Unexpected trailing data: decoded {bytes_read} of {} bytes",
            bytes.len()
        );
    }
    Ok(result)
}
