//! Distributed KV Adapter
//!
//! Implements the cache contract over a remote key-value store with a
//! single flat TTL per key. Values cross the wire as JSON text.

#[cfg(feature = "redis")]
mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::cache::{
    codec, resolve, validate_key, BackendCapabilities, Cache, CacheValue, IntoExpirationKind,
};
use crate::error::{CacheError, Result};

#[cfg(feature = "redis")]
pub use self::redis::RedisKvClient;

// == KV Store Client ==
/// Narrow interface to a remote key-value store.
///
/// Errors are surfaced to callers unchanged inside
/// [`CacheError::Transport`].
#[async_trait]
pub trait KvStoreClient: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn key_exists(&self, key: &str) -> std::result::Result<bool, Self::Error>;

    async fn string_get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, Self::Error>;

    /// Writes `value` with a TTL counted from now, replacing any previous TTL.
    async fn string_set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> std::result::Result<(), Self::Error>;

    /// Returns whether a key was deleted.
    async fn key_delete(&self, key: &str) -> std::result::Result<bool, Self::Error>;

    async fn health_check(&self) -> std::result::Result<bool, Self::Error> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str;
}

// == KV Cache ==
/// Distributed KV adapter. Sliding requests behave as absolute.
pub struct KvCache<C: KvStoreClient> {
    client: Arc<C>,
    default_ttl: Duration,
}

impl<C: KvStoreClient> Clone for KvCache<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            default_ttl: self.default_ttl,
        }
    }
}

impl<C: KvStoreClient> std::fmt::Debug for KvCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl<C: KvStoreClient> KvCache<C> {
    pub fn new(client: C, default_ttl: Duration) -> Self {
        info!(
            default_ttl_seconds = default_ttl.as_secs(),
            "Distributed KV cache adapter created"
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

impl<C: KvStoreClient> Cache for KvCache<C> {
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
            .string_set(key, payload, directive.ttl())
            .await
            .map_err(CacheError::transport)?;

        debug!(
            key = key,
            ttl_ms = directive.ttl().as_millis() as u64,
            "Cache SET (kv)"
        );
        Ok(())
    }

    async fn get<T: CacheValue>(&self, key: &str) -> Result<Option<T>> {
        validate_key(key)?;

        let bytes = self
            .client
            .string_get(key)
            .await
            .map_err(CacheError::transport)?;

        match bytes {
            Some(bytes) => {
                debug!(key = key, "Cache HIT (kv)");
                codec::decode(key, &bytes).map(Some)
            }
            None => {
                debug!(key = key, "Cache MISS (kv)");
                Ok(None)
            }
        }
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        self.client
            .key_exists(key)
            .await
            .map_err(CacheError::transport)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let deleted = self
            .client
            .key_delete(key)
            .await
            .map_err(CacheError::transport)?;

        debug!(key = key, deleted = deleted, "Cache DEL (kv)");
        Ok(())
    }
}
