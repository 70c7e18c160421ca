//! Cache key validation.

use crate::error::{CacheError, Result};

// == Validate Key ==
/// Rejects keys that are empty or consist only of whitespace.
///
/// Every adapter calls this before touching its store client, so an
/// invalid key never produces a partial write.
pub fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(CacheError::InvalidKey(
            "Cache key cannot be empty or whitespace".to_string(),
        ));
    }
    Ok(())
}
