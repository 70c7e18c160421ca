//! In-Memory Adapter
//!
//! Implements the cache contract over a process-local table. Values are
//! stored natively (no serialization) and both absolute and sliding
//! expiration are honoured.

mod entry;
mod lru;
mod stats;
mod table;

use std::any::TypeId;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::cache::{
    resolve, validate_key, BackendCapabilities, Cache, CacheValue, ExpiryDirective,
    IntoExpirationKind,
};
use crate::error::Result;

// Re-export public types
pub use entry::{MemoryEntry, StoredValue, MAX_LIFETIME};
pub use lru::AccessOrder;
pub use stats::TableStats;
pub use table::MemoryTable;
pub(crate) use table::WeakTable;

// == Memory Store ==
/// Client interface to the process-local table.
///
/// `try_get` is a read and slides sliding entries forward; `contains_key`
/// is a probe and must not. A value whose type is not `expected` is a
/// miss and leaves the entry untouched.
#[async_trait]
pub trait MemoryStore: Send + Sync + 'static {
    async fn try_get(&self, key: &str, expected: TypeId) -> Option<StoredValue>;

    async fn contains_key(&self, key: &str) -> bool;

    async fn set(&self, key: &str, value: StoredValue, directive: ExpiryDirective);

    async fn remove(&self, key: &str);
}

// == Memory Cache ==
/// In-memory adapter. Clones share the same table.
pub struct MemoryCache<S: MemoryStore = MemoryTable> {
    store: Arc<S>,
    default_ttl: Duration,
}

impl<S: MemoryStore> Clone for MemoryCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            default_ttl: self.default_ttl,
        }
    }
}

impl<S: MemoryStore> std::fmt::Debug for MemoryCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl MemoryCache<MemoryTable> {
    /// Creates an adapter over a fresh unbounded table.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_store(MemoryTable::new(), default_ttl)
    }

    /// Underlying table, for stats and the cleanup task.
    pub fn table(&self) -> &MemoryTable {
        &self.store
    }
}

impl<S: MemoryStore> MemoryCache<S> {
    /// Creates an adapter over an existing store.
    pub fn with_store(store: S, default_ttl: Duration) -> Self {
        info!(
            default_ttl_seconds = default_ttl.as_secs(),
            "In-memory cache adapter created"
        );
        Self {
            store: Arc::new(store),
            default_ttl,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: MemoryStore> Cache for MemoryCache<S> {
    fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::MEMORY
    }

    async fn set_with_policy<T: CacheValue, K: IntoExpirationKind>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
        kind: K,
    ) -> Result<()> {
        validate_key(key)?;
        let directive = resolve(ttl, kind, BackendCapabilities::MEMORY)?;

        self.store.set(key, Arc::new(value), directive).await;

        debug!(
            key = key,
            ttl_ms = ttl.as_millis() as u64,
            sliding = directive.is_sliding(),
            "Cache SET (memory)"
        );
        Ok(())
    }

    async fn get<T: CacheValue>(&self, key: &str) -> Result<Option<T>> {
        validate_key(key)?;

        let Some(stored) = self.store.try_get(key, TypeId::of::<T>()).await else {
            debug!(key = key, "Cache MISS (memory)");
            return Ok(None);
        };

        match stored.downcast_ref::<T>() {
            Some(value) => {
                debug!(key = key, "Cache HIT (memory)");
                Ok(Some(value.clone()))
            }
            None => {
                debug!(
                    key = key,
                    requested = std::any::type_name::<T>(),
                    "Cache entry holds a different type, treating as MISS (memory)"
                );
                Ok(None)
            }
        }
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.store.contains_key(key).await)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.store.remove(key).await;
        debug!(key = key, "Cache DEL (memory)");
        Ok(())
    }
}
