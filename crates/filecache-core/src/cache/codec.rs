use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CacheError, Result, CACHE_MAGIC, CACHE_VERSION};

/// Upper bound on any cache payload we encode or decode.
///
/// A corrupted length prefix must degrade to a decode error, not an attempt
/// to allocate whatever size the garbage bytes spell out.
pub const PAYLOAD_LIMIT_BYTES: u64 = 64 * 1024 * 1024;

fn bincode_options() -> impl Options + Copy {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
        .with_limit(PAYLOAD_LIMIT_BYTES)
}

const HEADER_LEN: usize = CACHE_MAGIC.len() + std::mem::size_of::<u32>();

/// Encode `value` behind the magic and format version header
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let payload = bincode_options().serialize(value)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(CACHE_MAGIC);
    bytes.extend_from_slice(&CACHE_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a value written by [`to_bytes`], checking the header first
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_LEN || !bytes.starts_with(CACHE_MAGIC) {
        return Err(CacheError::InvalidHeader);
    }

    let (version, payload) = bytes[CACHE_MAGIC.len()..].split_at(std::mem::size_of::<u32>());
    let mut raw = [0u8; 4];
    raw.copy_from_slice(version);
    let found = u32::from_le_bytes(raw);
    if found != CACHE_VERSION {
        return Err(CacheError::VersionMismatch {
            expected: CACHE_VERSION,
            found,
        });
    }

    bincode_options()
        .deserialize(payload)
        .map_err(CacheError::from)
}
