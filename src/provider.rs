//! Cache provider
//!
//! Uses enum dispatch for zero-cost selection between the adapters. The
//! caller picks one backend; there is no fallback and no tiering, so a
//! backend that fails to connect is an error, not a silent downgrade.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::cache::{BackendCapabilities, Cache, CacheValue, IntoExpirationKind};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::memory::{MemoryCache, MemoryTable};
use crate::tasks::spawn_cleanup_task;

#[cfg(feature = "redis")]
use crate::kv::{KvCache, RedisKvClient};

#[cfg(feature = "memcached")]
use crate::object::{MemcachedObjectClient, ObjectCache};

// == Backend Kind ==
/// Backend selectable through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Memory,
    Redis,
    Memcached,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Redis => "redis",
            BackendKind::Memcached => "memcached",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(BackendKind::Memory),
            "redis" => Ok(BackendKind::Redis),
            "memcached" => Ok(BackendKind::Memcached),
            other => Err(CacheError::UnknownBackend(other.to_string())),
        }
    }
}

// == Cache Provider ==
/// One selected cache adapter behind the unified contract.
#[derive(Debug, Clone)]
pub enum CacheProvider {
    Memory(MemoryCache),

    #[cfg(feature = "redis")]
    Redis(Box<KvCache<RedisKvClient>>),

    #[cfg(feature = "memcached")]
    Memcached(Box<ObjectCache<MemcachedObjectClient>>),
}

impl CacheProvider {
    /// Builds the backend named by `config.backend`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        match config.backend {
            BackendKind::Memory => Ok(Self::memory(config)),
            BackendKind::Redis => Self::redis(config).await,
            BackendKind::Memcached => Self::memcached(config).await,
        }
    }

    /// In-memory adapter over a table sized and swept per `config`.
    ///
    /// The sweep task is only spawned when a Tokio runtime is running.
    pub fn memory(config: &Config) -> Self {
        let table = MemoryTable::with_capacity(config.memory_max_entries);

        if config.memory_cleanup_interval > 0 && tokio::runtime::Handle::try_current().is_ok() {
            spawn_cleanup_task(table.clone(), config.memory_cleanup_interval);
        }

        info!(
            backend = "memory",
            max_entries = config.memory_max_entries,
            default_timeout_minutes = config.memory_default_timeout,
            "Cache provider initialized"
        );
        CacheProvider::Memory(MemoryCache::with_store(table, config.memory_default_ttl()))
    }

    /// Redis-backed KV adapter.
    #[cfg(feature = "redis")]
    pub async fn redis(config: &Config) -> Result<Self> {
        let client = RedisKvClient::connect(&config.redis_connection_string).await?;
        info!(
            backend = "redis",
            default_timeout_minutes = config.redis_default_timeout,
            "Cache provider initialized"
        );
        Ok(CacheProvider::Redis(Box::new(KvCache::new(
            client,
            config.redis_default_ttl(),
        ))))
    }

    /// Fallback when the redis feature is not enabled
    #[cfg(not(feature = "redis"))]
    pub async fn redis(_config: &Config) -> Result<Self> {
        Err(CacheError::UnknownBackend(
            "redis (crate built without the 'redis' feature)".to_string(),
        ))
    }

    /// Memcached-backed object-cache adapter.
    #[cfg(feature = "memcached")]
    pub async fn memcached(config: &Config) -> Result<Self> {
        let client = MemcachedObjectClient::connect(
            &config.memcached_server_address,
            config.memcached_server_port,
        )
        .await?;
        info!(
            backend = "memcached",
            default_timeout_minutes = config.memcached_default_timeout,
            "Cache provider initialized"
        );
        Ok(CacheProvider::Memcached(Box::new(ObjectCache::new(
            client,
            config.memcached_default_ttl(),
        ))))
    }

    /// Fallback when the memcached feature is not enabled
    #[cfg(not(feature = "memcached"))]
    pub async fn memcached(_config: &Config) -> Result<Self> {
        Err(CacheError::UnknownBackend(
            "memcached (crate built without the 'memcached' feature)".to_string(),
        ))
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            CacheProvider::Memory(_) => BackendKind::Memory,
            #[cfg(feature = "redis")]
            CacheProvider::Redis(_) => BackendKind::Redis,
            #[cfg(feature = "memcached")]
            CacheProvider::Memcached(_) => BackendKind::Memcached,
        }
    }

    /// Pings remote backends; the in-memory table is always healthy.
    pub async fn health_check(&self) -> Result<bool> {
        match self {
            CacheProvider::Memory(_) => Ok(true),
            #[cfg(feature = "redis")]
            CacheProvider::Redis(c) => c.health_check().await,
            #[cfg(feature = "memcached")]
            CacheProvider::Memcached(c) => c.health_check().await,
        }
    }
}

impl Cache for CacheProvider {
    fn default_ttl(&self) -> Duration {
        match self {
            CacheProvider::Memory(c) => c.default_ttl(),
            #[cfg(feature = "redis")]
            CacheProvider::Redis(c) => c.default_ttl(),
            #[cfg(feature = "memcached")]
            CacheProvider::Memcached(c) => c.default_ttl(),
        }
    }

    fn backend_name(&self) -> &'static str {
        match self {
            CacheProvider::Memory(c) => c.backend_name(),
            #[cfg(feature = "redis")]
            CacheProvider::Redis(c) => c.backend_name(),
            #[cfg(feature = "memcached")]
            CacheProvider::Memcached(c) => c.backend_name(),
        }
    }

    fn capabilities(&self) -> BackendCapabilities {
        match self {
            CacheProvider::Memory(c) => c.capabilities(),
            #[cfg(feature = "redis")]
            CacheProvider::Redis(c) => c.capabilities(),
            #[cfg(feature = "memcached")]
            CacheProvider::Memcached(c) => c.capabilities(),
        }
    }

    async fn set_with_policy<T: CacheValue, K: IntoExpirationKind>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
        kind: K,
    ) -> Result<()> {
        match self {
            CacheProvider::Memory(c) => c.set_with_policy(key, value, ttl, kind).await,
            #[cfg(feature = "redis")]
            CacheProvider::Redis(c) => c.set_with_policy(key, value, ttl, kind).await,
            #[cfg(feature = "memcached")]
            CacheProvider::Memcached(c) => c.set_with_policy(key, value, ttl, kind).await,
        }
    }

    async fn get<T: CacheValue>(&self, key: &str) -> Result<Option<T>> {
        match self {
            CacheProvider::Memory(c) => c.get(key).await,
            #[cfg(feature = "redis")]
            CacheProvider::Redis(c) => c.get(key).await,
            #[cfg(feature = "memcached")]
            CacheProvider::Memcached(c) => c.get(key).await,
        }
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        match self {
            CacheProvider::Memory(c) => c.contains(key).await,
            #[cfg(feature = "redis")]
            CacheProvider::Redis(c) => c.contains(key).await,
            #[cfg(feature = "memcached")]
            CacheProvider::Memcached(c) => c.contains(key).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match self {
            CacheProvider::Memory(c) => c.remove(key).await,
            #[cfg(feature = "redis")]
            CacheProvider::Redis(c) => c.remove(key).await,
            #[cfg(feature = "memcached")]
            CacheProvider::Memcached(c) => c.remove(key).await,
        }
    }
}
