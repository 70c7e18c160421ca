//! Memory Entry Module
//!
//! Defines the structure of an in-memory table entry with absolute or
//! sliding expiry.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::ExpiryDirective;

/// Type-erased value owned by the table.
pub type StoredValue = Arc<dyn Any + Send + Sync>;

/// Expiry horizon for durations the clock cannot represent (about 100 years).
pub const MAX_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// `from + ttl`, capped at [`MAX_LIFETIME`] when the sum would overflow.
fn deadline(from: Instant, ttl: Duration) -> Instant {
    from.checked_add(ttl).unwrap_or_else(|| from + MAX_LIFETIME)
}

// == Memory Entry ==
/// A single table entry holding a native value and its expiry state.
#[derive(Clone)]
pub struct MemoryEntry {
    /// The stored value
    pub value: StoredValue,
    /// Write instant
    pub created_at: Instant,
    /// Instant at which the entry stops being reachable
    pub expires_at: Instant,
    /// Set for sliding entries: each successful read pushes expiry this far out
    pub sliding_window: Option<Duration>,
}

impl std::fmt::Debug for MemoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEntry")
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("sliding_window", &self.sliding_window)
            .finish_non_exhaustive()
    }
}

impl MemoryEntry {
    // == Constructor ==
    /// Creates a new entry armed according to `directive`.
    pub fn new(value: StoredValue, directive: ExpiryDirective) -> Self {
        let now = Instant::now();
        let sliding_window = match directive {
            ExpiryDirective::SlidingWindow(window) => Some(window),
            ExpiryDirective::AbsoluteAfter(_) => None,
        };

        Self {
            value,
            created_at: now,
            expires_at: deadline(now, directive.ttl()),
            sliding_window,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiry
    /// instant, so a zero duration is expired immediately.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    // == Touch ==
    /// Records a successful read. Only sliding entries move their expiry.
    pub fn touch(&mut self) {
        if let Some(window) = self.sliding_window {
            self.expires_at = deadline(Instant::now(), window);
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
