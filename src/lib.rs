//! Polycache - one async cache contract over several backends
//!
//! Set, get, contains and remove behave the same whether the data lives
//! in a process-local table, a Redis-style KV store or a Memcached-style
//! object cache. Sliding expiration is honored in memory and degrades to
//! absolute expiration on the remote backends.

pub mod cache;
pub mod config;
pub mod error;
pub mod kv;
pub mod memory;
pub mod object;
pub mod provider;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use cache::{Cache, CacheValue, ExpirationKind, ExpirationPolicy};
pub use config::Config;
pub use error::{CacheError, Result};
pub use kv::{KvCache, KvStoreClient};
pub use memory::{MemoryCache, MemoryTable};
pub use object::{ObjectCache, ObjectStoreClient, StoreMode};
pub use provider::{BackendKind, CacheProvider};
pub use tasks::spawn_cleanup_task;

#[cfg(feature = "redis")]
pub use kv::RedisKvClient;

#[cfg(feature = "memcached")]
pub use object::MemcachedObjectClient;

// Store client traits are written with async_trait
pub use async_trait::async_trait;
