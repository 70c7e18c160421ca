//! Expiration Policy Module
//!
//! Translates a (duration, kind) pair into the expiration directive a
//! backend can actually honour. The sliding-to-absolute degradation for
//! remote stores lives here and nowhere else.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheError, Result};

// == Expiration Kind ==
/// How an entry's lifetime is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpirationKind {
    /// Expires a fixed duration after the write.
    Absolute,
    /// Expires once it has not been read for the duration.
    Sliding,
}

impl ExpirationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpirationKind::Absolute => "absolute",
            ExpirationKind::Sliding => "sliding",
        }
    }
}

impl fmt::Display for ExpirationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpirationKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absolute" => Ok(ExpirationKind::Absolute),
            "sliding" => Ok(ExpirationKind::Sliding),
            _ => Err(CacheError::UnsupportedExpirationKind(s.to_string())),
        }
    }
}

impl TryFrom<u8> for ExpirationKind {
    type Error = CacheError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(ExpirationKind::Absolute),
            1 => Ok(ExpirationKind::Sliding),
            other => Err(CacheError::UnsupportedExpirationKind(other.to_string())),
        }
    }
}

// == Into Expiration Kind ==
/// Accepts either a typed kind or a raw name/code coming from callers,
/// configuration or another service.
pub trait IntoExpirationKind: Send {
    fn into_expiration_kind(self) -> Result<ExpirationKind>;
}

impl IntoExpirationKind for ExpirationKind {
    fn into_expiration_kind(self) -> Result<ExpirationKind> {
        Ok(self)
    }
}

impl IntoExpirationKind for &str {
    fn into_expiration_kind(self) -> Result<ExpirationKind> {
        self.parse()
    }
}

impl IntoExpirationKind for String {
    fn into_expiration_kind(self) -> Result<ExpirationKind> {
        self.parse()
    }
}

impl IntoExpirationKind for u8 {
    fn into_expiration_kind(self) -> Result<ExpirationKind> {
        ExpirationKind::try_from(self)
    }
}

// == Backend Capabilities ==
/// Expiration features a backend supports natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    pub supports_sliding: bool,
}

impl BackendCapabilities {
    /// Process-local table: absolute and sliding.
    pub const MEMORY: Self = Self {
        supports_sliding: true,
    };

    /// TTL-only remote stores (Redis, Memcached).
    pub const REMOTE: Self = Self {
        supports_sliding: false,
    };
}

// == Expiry Directive ==
/// Backend-native expiration instruction handed to a store client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryDirective {
    /// Entry dies `ttl` after the write.
    AbsoluteAfter(Duration),
    /// Entry dies after `window` without a read.
    SlidingWindow(Duration),
}

impl ExpiryDirective {
    /// Duration the directive arms on write.
    pub fn ttl(&self) -> Duration {
        match self {
            ExpiryDirective::AbsoluteAfter(ttl) | ExpiryDirective::SlidingWindow(ttl) => *ttl,
        }
    }

    pub fn is_sliding(&self) -> bool {
        matches!(self, ExpiryDirective::SlidingWindow(_))
    }
}

// == Expiration Policy ==
/// Kind plus duration, as requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirationPolicy {
    Absolute(Duration),
    Sliding(Duration),
}

impl ExpirationPolicy {
    pub fn new(duration: Duration, kind: ExpirationKind) -> Self {
        match kind {
            ExpirationKind::Absolute => ExpirationPolicy::Absolute(duration),
            ExpirationKind::Sliding => ExpirationPolicy::Sliding(duration),
        }
    }

    pub fn kind(&self) -> ExpirationKind {
        match self {
            ExpirationPolicy::Absolute(_) => ExpirationKind::Absolute,
            ExpirationPolicy::Sliding(_) => ExpirationKind::Sliding,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            ExpirationPolicy::Absolute(d) | ExpirationPolicy::Sliding(d) => *d,
        }
    }

    /// Maps the policy onto what `capabilities` can express.
    ///
    /// Sliding on a backend without sliding support becomes absolute:
    /// the TTL is fixed at write time and reads do not extend it.
    pub fn resolve(&self, capabilities: BackendCapabilities) -> ExpiryDirective {
        match *self {
            ExpirationPolicy::Absolute(ttl) => ExpiryDirective::AbsoluteAfter(ttl),
            ExpirationPolicy::Sliding(window) if capabilities.supports_sliding => {
                ExpiryDirective::SlidingWindow(window)
            }
            ExpirationPolicy::Sliding(ttl) => {
                debug!(
                    ttl_ms = ttl.as_millis() as u64,
                    "Sliding expiration not supported by backend, using absolute"
                );
                ExpiryDirective::AbsoluteAfter(ttl)
            }
        }
    }
}

// == Resolve ==
/// Resolves a raw (duration, kind) request against a backend's capabilities.
///
/// Fails only when `kind` is outside {absolute, sliding}.
pub fn resolve<K: IntoExpirationKind>(
    duration: Duration,
    kind: K,
    capabilities: BackendCapabilities,
) -> Result<ExpiryDirective> {
    let kind = kind.into_expiration_kind()?;
    Ok(ExpirationPolicy::new(duration, kind).resolve(capabilities))
}
