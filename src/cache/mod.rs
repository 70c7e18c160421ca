//! Cache Module
//!
//! The unified cache contract plus the policy, codec and key validation
//! shared by every backend adapter.

pub mod codec;
mod key;
mod policy;


use std::future::Future;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

// Re-export public types
pub use key::validate_key;
pub use policy::{
    resolve, BackendCapabilities, ExpirationKind, ExpirationPolicy, ExpiryDirective,
    IntoExpirationKind,
};

// == Cache Value ==
/// Bound for values accepted by every adapter.
///
/// Remote adapters need serde; the in-memory adapter hands back clones of
/// the stored value.
pub trait CacheValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

// == Cache Contract ==
/// Operations shared by the in-memory, KV and object-cache adapters.
///
/// Invalid keys and unsupported expiration kinds fail before the store
/// client is called. A missing or expired key is `Ok(None)` / `Ok(false)`,
/// never an error.
pub trait Cache: Send + Sync {
    /// Default expiration applied by [`Cache::set`].
    fn default_ttl(&self) -> Duration;

    /// Static backend name used in logs.
    fn backend_name(&self) -> &'static str;

    /// Expiration features the backend honours natively.
    fn capabilities(&self) -> BackendCapabilities;

    /// Stores `value` with the default TTL and absolute expiration.
    fn set<T: CacheValue>(&self, key: &str, value: T) -> impl Future<Output = Result<()>> + Send {
        self.set_with_policy(key, value, self.default_ttl(), ExpirationKind::Absolute)
    }

    /// Stores `value` with an absolute expiration of `ttl`.
    fn set_with_ttl<T: CacheValue>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> impl Future<Output = Result<()>> + Send {
        self.set_with_policy(key, value, ttl, ExpirationKind::Absolute)
    }

    /// Stores `value` with full control over the expiration.
    ///
    /// Sliding is honoured only where [`BackendCapabilities::supports_sliding`]
    /// is set; elsewhere it behaves as absolute.
    fn set_with_policy<T: CacheValue, K: IntoExpirationKind>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
        kind: K,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Reads and decodes the value under `key`.
    ///
    /// On sliding-capable backends a hit resets the entry's timer.
    fn get<T: CacheValue>(&self, key: &str) -> impl Future<Output = Result<Option<T>>> + Send;

    /// True if a live entry exists. Never refreshes sliding expiry.
    fn contains(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Deletes the entry. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}
