//! Configuration Module
//!
//! Startup parameters for the cache adapters, loaded from environment
//! variables. Read once at construction; adapters never consult it again.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::provider::BackendKind;

/// Default expiration applied by `set` when no TTL is given, in minutes.
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 10;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Backend selected by `CacheProvider::from_config`
    pub backend: BackendKind,
    /// In-memory default expiration in minutes
    pub memory_default_timeout: u64,
    /// Maximum in-memory entries, 0 = unbounded
    pub memory_max_entries: usize,
    /// Interval in seconds between expired-entry sweeps, 0 = disabled
    pub memory_cleanup_interval: u64,
    /// Redis URL or `host:port`
    pub redis_connection_string: String,
    /// Redis default expiration in minutes
    pub redis_default_timeout: u64,
    /// Memcached server address
    pub memcached_server_address: String,
    /// Memcached server port
    pub memcached_server_port: u16,
    /// Memcached default expiration in minutes
    pub memcached_default_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_BACKEND` - memory, redis or memcached (default: memory)
    /// - `CACHE_MEMORY_DEFAULT_TIMEOUT` - minutes (default: 10)
    /// - `CACHE_MEMORY_MAX_ENTRIES` - entry bound (default: 0, unbounded)
    /// - `CACHE_MEMORY_CLEANUP_INTERVAL` - seconds (default: 60)
    /// - `CACHE_REDIS_CONNECTION_STRING` - (default: localhost:6379)
    /// - `CACHE_REDIS_DEFAULT_TIMEOUT` - minutes (default: 10)
    /// - `CACHE_MEMCACHED_SERVER_ADDRESS` - (default: 127.0.0.1)
    /// - `CACHE_MEMCACHED_SERVER_PORT` - (default: 11211)
    /// - `CACHE_MEMCACHED_DEFAULT_TIMEOUT` - minutes (default: 10)
    ///
    /// Unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: parsed("CACHE_BACKEND").unwrap_or(defaults.backend),
            memory_default_timeout: parsed("CACHE_MEMORY_DEFAULT_TIMEOUT")
                .unwrap_or(defaults.memory_default_timeout),
            memory_max_entries: parsed("CACHE_MEMORY_MAX_ENTRIES")
                .unwrap_or(defaults.memory_max_entries),
            memory_cleanup_interval: parsed("CACHE_MEMORY_CLEANUP_INTERVAL")
                .unwrap_or(defaults.memory_cleanup_interval),
            redis_connection_string: non_empty("CACHE_REDIS_CONNECTION_STRING")
                .unwrap_or(defaults.redis_connection_string),
            redis_default_timeout: parsed("CACHE_REDIS_DEFAULT_TIMEOUT")
                .unwrap_or(defaults.redis_default_timeout),
            memcached_server_address: non_empty("CACHE_MEMCACHED_SERVER_ADDRESS")
                .unwrap_or(defaults.memcached_server_address),
            memcached_server_port: parsed("CACHE_MEMCACHED_SERVER_PORT")
                .unwrap_or(defaults.memcached_server_port),
            memcached_default_timeout: parsed("CACHE_MEMCACHED_DEFAULT_TIMEOUT")
                .unwrap_or(defaults.memcached_default_timeout),
        }
    }

    pub fn memory_default_ttl(&self) -> Duration {
        minutes(self.memory_default_timeout)
    }

    pub fn redis_default_ttl(&self) -> Duration {
        minutes(self.redis_default_timeout)
    }

    pub fn memcached_default_ttl(&self) -> Duration {
        minutes(self.memcached_default_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            memory_default_timeout: DEFAULT_TIMEOUT_MINUTES,
            memory_max_entries: 0,
            memory_cleanup_interval: 60,
            redis_connection_string: "localhost:6379".to_string(),
            redis_default_timeout: DEFAULT_TIMEOUT_MINUTES,
            memcached_server_address: "127.0.0.1".to_string(),
            memcached_server_port: 11211,
            memcached_default_timeout: DEFAULT_TIMEOUT_MINUTES,
        }
    }
}

fn parsed<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}
