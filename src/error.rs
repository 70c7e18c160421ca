//! Error types for the cache adapters
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

/// Boxed error produced by an underlying store client.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for every cache adapter.
///
/// Validation variants are raised before any backend call is made.
/// Store client failures are carried unchanged in [`CacheError::Transport`].
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty or whitespace only
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    /// Expiration kind outside of {absolute, sliding}
    #[error("Unsupported expiration kind: {0}")]
    UnsupportedExpirationKind(String),

    /// Value could not be encoded for a remote backend
    #[error("Failed to serialize value for key '{key}': {source}")]
    SerializationFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored bytes do not decode to the requested type
    #[error("Failed to deserialize value for key '{key}': {source}")]
    DeserializationFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Backend name not recognised by the provider
    #[error("Unknown cache backend: {0}")]
    UnknownBackend(String),

    /// Store client failure, passed through untouched
    #[error(transparent)]
    Transport(TransportError),
}

impl CacheError {
    /// Wraps a store client error without translating it.
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CacheError::Transport(Box::new(err))
    }

    /// Returns the original store client error, if this is a transport failure.
    ///
    /// Callers downcast it to the client's concrete error type to drive
    /// their own retry policy.
    pub fn transport_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            CacheError::Transport(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// True for errors raised by local validation rather than by a backend.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CacheError::InvalidKey(_)
                | CacheError::UnsupportedExpirationKind(_)
                | CacheError::SerializationFailed { .. }
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
