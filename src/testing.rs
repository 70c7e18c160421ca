//! In-process fakes of the store clients with call recording.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;

use crate::cache::ExpiryDirective;
use crate::kv::KvStoreClient;
use crate::memory::{MemoryStore, MemoryTable, StoredValue, MAX_LIFETIME};
use crate::object::{ObjectStoreClient, StoreMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: String,
}

impl SessionRecord {
    pub fn new(user: &str) -> Self {
        Self {
            user: user.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FakeTransportError {
    #[error("operation timed out")]
    Timeout,
    #[error("connection refused")]
    ConnectionRefused,
}

#[derive(Debug, Clone)]
struct FakeItem {
    bytes: Vec<u8>,
    ttl: Duration,
    expires_at: Instant,
}

impl FakeItem {
    fn new(bytes: Vec<u8>, ttl: Duration) -> Self {
        Self {
            bytes,
            ttl,
            expires_at: Instant::now()
                .checked_add(ttl)
                .unwrap_or_else(|| Instant::now() + MAX_LIFETIME),
        }
    }

    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// TTL-only item store shared by both remote fakes.
#[derive(Debug, Default)]
struct FakeRemote {
    items: Mutex<HashMap<String, FakeItem>>,
    calls: AtomicUsize,
    fail_next: Mutex<Option<FakeTransportError>>,
}

impl FakeRemote {
    fn begin(&self) -> Result<(), FakeTransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn live(&self, key: &str) -> Option<FakeItem> {
        let mut items = self.items.lock().unwrap();
        match items.get(key) {
            Some(item) if item.is_live() => Some(item.clone()),
            Some(_) => {
                items.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, bytes: Vec<u8>, ttl: Duration) {
        self.items
            .lock()
            .unwrap()
            .insert(key.to_string(), FakeItem::new(bytes, ttl));
    }

    fn delete(&self, key: &str) -> bool {
        self.items
            .lock()
            .unwrap()
            .remove(key)
            .is_some_and(|item| item.is_live())
    }
}

// == Fake KV Client ==
#[derive(Debug, Default)]
pub struct FakeKvClient {
    remote: FakeRemote,
}

impl FakeKvClient {
    pub fn calls(&self) -> usize {
        self.remote.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self, err: FakeTransportError) {
        *self.remote.fail_next.lock().unwrap() = Some(err);
    }

    /// Raw stored bytes and the TTL they were written with.
    pub fn raw(&self, key: &str) -> Option<(Vec<u8>, Duration)> {
        self.remote.live(key).map(|item| (item.bytes, item.ttl))
    }
}

#[async_trait]
impl KvStoreClient for FakeKvClient {
    type Error = FakeTransportError;

    async fn key_exists(&self, key: &str) -> Result<bool, FakeTransportError> {
        self.remote.begin()?;
        Ok(self.remote.live(key).is_some())
    }

    async fn string_get(&self, key: &str) -> Result<Option<Vec<u8>>, FakeTransportError> {
        self.remote.begin()?;
        Ok(self.remote.live(key).map(|item| item.bytes))
    }

    async fn string_set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), FakeTransportError> {
        self.remote.begin()?;
        self.remote.put(key, value, ttl);
        Ok(())
    }

    async fn key_delete(&self, key: &str) -> Result<bool, FakeTransportError> {
        self.remote.begin()?;
        Ok(self.remote.delete(key))
    }

    fn provider_name(&self) -> &'static str {
        "fake-kv"
    }
}

// == Fake Object Client ==
#[derive(Debug, Default)]
pub struct FakeObjectClient {
    remote: FakeRemote,
    gets: AtomicUsize,
    last_mode: Mutex<Option<StoreMode>>,
}

impl FakeObjectClient {
    pub fn calls(&self) -> usize {
        self.remote.calls.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn last_mode(&self) -> Option<StoreMode> {
        *self.last_mode.lock().unwrap()
    }

    pub fn fail_next(&self, err: FakeTransportError) {
        *self.remote.fail_next.lock().unwrap() = Some(err);
    }

    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.remote.live(key).map(|item| item.ttl)
    }

    /// Writes bytes as another client would, bypassing the codec.
    pub fn put_raw(&self, key: &str, bytes: Vec<u8>) {
        self.remote.put(key, bytes, Duration::from_secs(3600));
    }
}

#[async_trait]
impl ObjectStoreClient for FakeObjectClient {
    type Error = FakeTransportError;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, FakeTransportError> {
        self.remote.begin()?;
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.remote.live(key).map(|item| item.bytes))
    }

    async fn store(
        &self,
        mode: StoreMode,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<bool, FakeTransportError> {
        self.remote.begin()?;
        *self.last_mode.lock().unwrap() = Some(mode);
        if mode == StoreMode::Add && self.remote.live(key).is_some() {
            return Ok(false);
        }
        self.remote.put(key, value, ttl);
        Ok(true)
    }

    async fn remove(&self, key: &str) -> Result<bool, FakeTransportError> {
        self.remote.begin()?;
        Ok(self.remote.delete(key))
    }

    fn provider_name(&self) -> &'static str {
        "fake-object"
    }
}

// == Recording Memory Store ==
/// Real table that counts every call reaching it.
#[derive(Debug, Default)]
pub struct RecordingMemoryStore {
    table: MemoryTable,
    calls: AtomicUsize,
}

impl RecordingMemoryStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MemoryStore for RecordingMemoryStore {
    async fn try_get(&self, key: &str, expected: TypeId) -> Option<StoredValue> {
        self.record();
        self.table.try_get(key, expected).await
    }

    async fn contains_key(&self, key: &str) -> bool {
        self.record();
        self.table.contains_key(key).await
    }

    async fn set(&self, key: &str, value: StoredValue, directive: ExpiryDirective) {
        self.record();
        self.table.set(key, value, directive).await
    }

    async fn remove(&self, key: &str) {
        self.record();
        self.table.remove(key).await
    }
}
