//! Object-Cache Adapter
//!
//! Implements the cache contract over a slab/item object cache with
//! TTL-only expiration. Values cross the wire as JSON text.
//!
//! The protocol has no existence probe, so `contains` performs a full
//! read and discards the payload.

#[cfg(feature = "memcached")]
mod memcached;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::cache::{
    codec, resolve, validate_key, BackendCapabilities, Cache, CacheValue, IntoExpirationKind,
};
use crate::error::{CacheError, Result};

#[cfg(feature = "memcached")]
pub use self::memcached::MemcachedObjectClient;

// == Store Mode ==
/// Write semantics for [`ObjectStoreClient::store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Unconditional write
    Set,
    /// Write only if the key is absent
    Add,
}

// == Object Store Client ==
/// Narrow interface to a remote object cache.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, Self::Error>;

    /// Returns whether the item was written (`Add` on a present key is not).
    async fn store(
        &self,
        mode: StoreMode,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> std::result::Result<bool, Self::Error>;

    /// Returns whether an item was removed. Absent keys are not an error.
    async fn remove(&self, key: &str) -> std::result::Result<bool, Self::Error>;

    async fn health_check(&self) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str;
}

// == Object Cache ==
/// Object-cache adapter. Sliding requests behave as absolute.
pub struct ObjectCache<C: ObjectStoreClient> {
    client: Arc<C>,
    default_ttl: Duration,
}

impl<C: ObjectStoreClient> Clone for ObjectCache<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            default_ttl: self.default_ttl,
        }
    }
}

impl<C: ObjectStoreClient> std::fmt::Debug for ObjectCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl<C: ObjectStoreClient> ObjectCache<C> {
    pub fn new(client: C, default_ttl: Duration) -> Self {
        info!(
            default_ttl_seconds = default_ttl.as_secs(),
            "Object cache adapter created"
        );
        Self {
            client: Arc::new(client),
            default_ttl,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.client
            .health_check()
            .await
            .map_err(CacheError::transport)
    }
}

impl<C: ObjectStoreClient> Cache for ObjectCache<C> {
    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn backend_name(&self) -> &'static str {
        self.client.provider_name()
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::REMOTE
    }

    async fn set_with_policy<T: CacheValue, K: IntoExpirationKind>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
        kind: K,
    ) -> Result<()> {
        validate_key(key)?;
        let directive = resolve(ttl, kind, BackendCapabilities::REMOTE)?;
        let payload = codec::encode(key, &value)?;

        self.client
            .store(StoreMode::Set, key, payload, directive.ttl())
            .await
            .map_err(CacheError::transport)?;

        debug!(
            key = key,
            ttl_ms = directive.ttl().as_millis() as u64,
            "Cache SET (object)"
        );
        Ok(())
    }

    async fn get<T: CacheValue>(&self, key: &str) -> Result<Option<T>> {
        validate_key(key)?;

        let item = self.client.get(key).await.map_err(CacheError::transport)?;

        match item {
            Some(bytes) => {
                debug!(key = key, "Cache HIT (object)");
                codec::decode(key, &bytes).map(Some)
            }
            None => {
                debug!(key = key, "Cache MISS (object)");
                Ok(None)
            }
        }
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        // Full read: the payload is fetched and dropped undecoded
        let item = self.client.get(key).await.map_err(CacheError::transport)?;
        Ok(item.is_some())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let removed = self
            .client
            .remove(key)
            .await
            .map_err(CacheError::transport)?;

        debug!(key = key, removed = removed, "Cache DEL (object)");
        Ok(())
    }
}
