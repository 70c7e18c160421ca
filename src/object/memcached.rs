//! Memcached store client
//!
//! Provides object-cache access using the memcached protocol.
//! Requires the `memcached` feature flag.

use std::sync::Arc;
use std::time::Duration;

use async_memcached::{Client, Error as MemcachedError, Status};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::object::{ObjectStoreClient, StoreMode};

/// Relative exptimes above 30 days are read by memcached as unix timestamps.
const MAX_RELATIVE_EXPTIME_SECS: u64 = 60 * 60 * 24 * 30;

/// Exptime is parsed as a signed 32-bit value.
const MAX_ABSOLUTE_EXPTIME: i64 = i32::MAX as i64;

/// Memcached-backed object client
///
/// Uses the async-memcached client for async operations. The connection
/// is not multiplexed, so commands are serialized through a mutex.
pub struct MemcachedObjectClient {
    client: Arc<Mutex<Client>>,
}

impl std::fmt::Debug for MemcachedObjectClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemcachedObjectClient")
            .field("client", &"Client")
            .finish()
    }
}

impl Clone for MemcachedObjectClient {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl MemcachedObjectClient {
    /// Connects to the memcached server at `address:port`.
    pub async fn connect(address: &str, port: u16) -> Result<Self> {
        let dsn = format!("tcp://{}:{}", address.trim(), port);

        let client = Client::new(&dsn).await.map_err(CacheError::transport)?;

        debug!(dsn = %dsn, "Memcached object client connected");

        Ok(Self {
            client: Arc::new(Mutex::new(client)),
        })
    }
}

#[async_trait]
impl ObjectStoreClient for MemcachedObjectClient {
    type Error = MemcachedError;

    async fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, MemcachedError> {
        let mut client = self.client.lock().await;
        let item = client.get(key).await?;
        Ok(item.map(|value| value.data))
    }

    async fn store(
        &self,
        mode: StoreMode,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> std::result::Result<bool, MemcachedError> {
        let mut client = self.client.lock().await;
        let exptime = exptime(ttl);

        let outcome = match mode {
            StoreMode::Set => client.set(key, value.as_slice(), Some(exptime), None).await,
            StoreMode::Add => client.add(key, value.as_slice(), Some(exptime), None).await,
        };

        match outcome {
            Ok(()) => {
                debug!(key = key, exptime = exptime, mode = ?mode, "Memcached store");
                Ok(true)
            }
            Err(MemcachedError::Protocol(Status::NotStored)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn remove(&self, key: &str) -> std::result::Result<bool, MemcachedError> {
        let mut client = self.client.lock().await;

        // Memcached reports NOT_FOUND for absent keys, which is fine
        match client.delete(key).await {
            Ok(()) => Ok(true),
            Err(MemcachedError::Protocol(Status::NotFound)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, MemcachedError> {
        let mut client = self.client.lock().await;

        // Use version command as health check
        match client.version().await {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(error = %e, "Memcached health check failed");
                Ok(false)
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "memcached"
    }
}

/// Converts a TTL to a memcached exptime.
///
/// Zero means "never" to memcached, so a zero TTL becomes -1 (expire now).
/// Sub-second remainders round up; long TTLs become absolute timestamps,
/// capped at the largest exptime the server parses.
fn exptime(ttl: Duration) -> i64 {
    if ttl.is_zero() {
        return -1;
    }

    let secs = ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0));

    if secs > MAX_RELATIVE_EXPTIME_SECS {
        let relative = i64::try_from(secs).unwrap_or(i64::MAX);
        chrono::Utc::now()
            .timestamp()
            .saturating_add(relative)
            .min(MAX_ABSOLUTE_EXPTIME)
    } else {
        secs as i64
    }
}
