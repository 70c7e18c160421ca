//! Value Codec Module
//!
//! Single point where typed values become wire bytes for remote backends
//! and back. Encoding is JSON text so any client can read what another wrote.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CacheError, Result};

// == Encode ==
/// Serializes `value` to JSON bytes.
pub fn encode<T: Serialize>(key: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|source| CacheError::SerializationFailed {
        key: key.to_string(),
        source,
    })
}

// == Decode ==
/// Deserializes JSON bytes into `T`.
///
/// A mismatch between the stored document and `T` is reported as
/// `DeserializationFailed`, never as absence.
pub fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|source| CacheError::DeserializationFailed {
        key: key.to_string(),
        source,
    })
}
