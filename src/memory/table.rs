//! Memory Table Module
//!
//! Process-local, thread-safe key→entry table backing the in-memory adapter.
//! Combines HashMap storage with LRU tracking and lazy expiry.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::ExpiryDirective;
use crate::memory::{AccessOrder, MemoryEntry, MemoryStore, StoredValue, TableStats};

// == Table State ==
#[derive(Debug, Default)]
struct TableState {
    entries: HashMap<String, MemoryEntry>,
    order: AccessOrder,
    stats: TableStats,
    /// None = unbounded
    max_entries: Option<usize>,
}

impl TableState {
    /// Stores an entry, evicting the least recently used key when full.
    fn insert(&mut self, key: &str, value: StoredValue, directive: ExpiryDirective) {
        let is_overwrite = self.entries.contains_key(key);

        if let Some(max) = self.max_entries {
            if !is_overwrite && self.entries.len() >= max {
                if let Some(evicted) = self.order.pop_oldest() {
                    self.entries.remove(&evicted);
                    self.stats.record_eviction();
                    debug!(key = %evicted, "Memory table evicted LRU entry");
                }
            }
        }

        self.entries
            .insert(key.to_string(), MemoryEntry::new(value, directive));
        self.order.touch(key);
    }

    /// Reads a live entry of the `expected` type, sliding its expiry forward.
    fn lookup(&mut self, key: &str, expected: TypeId) -> Option<StoredValue> {
        let expired = match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired() && (*entry.value).type_id() != expected => {
                debug!(key = key, "Memory table entry holds a different type");
                false
            }
            Some(entry) if !entry.is_expired() => {
                entry.touch();
                let value = Arc::clone(&entry.value);
                self.order.touch(key);
                self.stats.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.drop_entry(key);
            self.stats.record_expirations(1);
        }
        self.stats.record_miss();
        None
    }

    fn is_live(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    fn drop_entry(&mut self, key: &str) -> bool {
        self.order.forget(key);
        self.entries.remove(key).is_some()
    }

    fn purge_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.drop_entry(key);
        }

        self.stats.record_expirations(expired.len());
        expired.len()
    }
}

// == Memory Table ==
/// Shared handle to the in-memory table. Clones refer to the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    state: Arc<RwLock<TableState>>,
}

impl MemoryTable {
    /// Creates an unbounded table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding at most `max_entries` entries.
    ///
    /// A bound of zero means unbounded.
    pub fn with_capacity(max_entries: usize) -> Self {
        let state = TableState {
            max_entries: (max_entries > 0).then_some(max_entries),
            ..TableState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    // == Cleanup Expired ==
    /// Removes every expired entry and returns how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        self.state.write().await.purge_expired()
    }

    /// Handle that does not keep the table alive.
    pub(crate) fn downgrade(&self) -> WeakTable {
        WeakTable(Arc::downgrade(&self.state))
    }

    // == Stats ==
    pub async fn stats(&self) -> TableStats {
        let state = self.state.read().await;
        let mut stats = state.stats.clone();
        stats.total_entries = state.entries.len();
        stats
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

/// Non-owning reference to a [`MemoryTable`], held by background tasks.
#[derive(Debug, Clone)]
pub(crate) struct WeakTable(Weak<RwLock<TableState>>);

impl WeakTable {
    /// The table, unless every owning handle has been dropped.
    pub(crate) fn upgrade(&self) -> Option<MemoryTable> {
        self.0.upgrade().map(|state| MemoryTable { state })
    }
}

#[async_trait]
impl MemoryStore for MemoryTable {
    async fn try_get(&self, key: &str, expected: TypeId) -> Option<StoredValue> {
        self.state.write().await.lookup(key, expected)
    }

    async fn contains_key(&self, key: &str) -> bool {
        self.state.read().await.is_live(key)
    }

    async fn set(&self, key: &str, value: StoredValue, directive: ExpiryDirective) {
        self.state.write().await.insert(key, value, directive);
    }

    async fn remove(&self, key: &str) {
        self.state.write().await.drop_entry(key);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const MINUTE: Duration = Duration::from_secs(60);

    fn absolute(ttl: Duration) -> ExpiryDirective {
        ExpiryDirective::AbsoluteAfter(ttl)
    }

    fn text(s: &str) -> StoredValue {
        Arc::new(s.to_string())
    }

    fn text_id() -> TypeId {
        TypeId::of::<String>()
    }

    fn as_text(value: Option<StoredValue>) -> Option<String> {
        value.and_then(|v| v.downcast_ref::<String>().cloned())
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let table = MemoryTable::new();
        table.set("key1", text("value1"), absolute(MINUTE)).await;

        assert_eq!(as_text(table.try_get("key1", text_id()).await).as_deref(), Some("value1"));
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let table = MemoryTable::new();
        assert!(table.try_get("missing", text_id()).await.is_none());
        assert_eq!(table.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let table = MemoryTable::new();
        table.set("key1", text("value1"), absolute(MINUTE)).await;
        table.set("key1", text("value2"), absolute(MINUTE)).await;

        assert_eq!(as_text(table.try_get("key1", text_id()).await).as_deref(), Some("value2"));
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let table = MemoryTable::new();
        table.set("key1", text("value1"), absolute(MINUTE)).await;

        table.remove("key1").await;
        table.remove("key1").await;

        assert!(table.is_empty().await);
        assert!(!table.contains_key("key1").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_absolute_expiry() {
        let table = MemoryTable::new();
        table.set("key1", text("value1"), absolute(Duration::from_secs(1))).await;
        assert!(table.try_get("key1", text_id()).await.is_some());

        tokio::time::advance(Duration::from_millis(1100)).await;

        assert!(!table.contains_key("key1").await);
        assert!(table.try_get("key1", text_id()).await.is_none());
        // Lazily dropped on the failed read
        assert_eq!(table.len().await, 0);
        assert_eq!(table.stats().await.expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sliding_refreshed_by_get_only() {
        let table = MemoryTable::new();
        let window = ExpiryDirective::SlidingWindow(Duration::from_secs(10));
        table.set("read", text("v"), window).await;
        table.set("peek", text("v"), window).await;

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(table.contains_key("peek").await);

        for _ in 0..3 {
            assert!(table.try_get("read", text_id()).await.is_some());
            tokio::time::advance(Duration::from_secs(6)).await;
        }

        // 24s elapsed: "read" kept alive by reads, "peek" only probed
        assert!(table.contains_key("read").await);
        assert!(!table.contains_key("peek").await);
    }

    #[tokio::test]
    async fn test_zero_ttl_never_readable() {
        let table = MemoryTable::new();
        table.set("key1", text("v"), absolute(Duration::ZERO)).await;
        assert!(table.try_get("key1", text_id()).await.is_none());
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let table = MemoryTable::with_capacity(3);
        table.set("key1", text("1"), absolute(MINUTE)).await;
        table.set("key2", text("2"), absolute(MINUTE)).await;
        table.set("key3", text("3"), absolute(MINUTE)).await;

        // key1 becomes most recent, key2 is next out
        assert!(table.try_get("key1", text_id()).await.is_some());
        table.set("key4", text("4"), absolute(MINUTE)).await;

        assert_eq!(table.len().await, 3);
        assert!(table.contains_key("key1").await);
        assert!(!table.contains_key("key2").await);
        assert_eq!(table.stats().await.evictions, 1);
    }

    #[tokio::test]
    async fn test_overwrite_at_capacity_does_not_evict() {
        let table = MemoryTable::with_capacity(2);
        table.set("key1", text("1"), absolute(MINUTE)).await;
        table.set("key2", text("2"), absolute(MINUTE)).await;
        table.set("key1", text("1b"), absolute(MINUTE)).await;

        assert_eq!(table.len().await, 2);
        assert_eq!(table.stats().await.evictions, 0);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_unbounded() {
        let table = MemoryTable::with_capacity(0);
        for i in 0..50 {
            table.set(&format!("key{}", i), text("v"), absolute(MINUTE)).await;
        }
        assert_eq!(table.len().await, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired() {
        let table = MemoryTable::new();
        table.set("short", text("v"), absolute(Duration::from_secs(1))).await;
        table.set("long", text("v"), absolute(Duration::from_secs(10))).await;

        tokio::time::advance(Duration::from_millis(1100)).await;

        assert_eq!(table.cleanup_expired().await, 1);
        assert_eq!(table.len().await, 1);
        assert!(table.contains_key("long").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_type_mismatch_is_untouched_miss() {
        let table = MemoryTable::with_capacity(2);
        let window = ExpiryDirective::SlidingWindow(Duration::from_secs(10));
        table.set("n", Arc::new(1u64), window).await;
        table.set("other", text("v"), absolute(MINUTE)).await;

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(table.try_get("n", text_id()).await.is_none());

        // "n" stays least recently used
        table.set("third", text("v"), absolute(MINUTE)).await;
        assert!(!table.contains_key("n").await);

        let stats = table.stats().await;
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expirations, 0);
    }

    #[test]
    fn test_weak_handle_does_not_own_table() {
        let table = MemoryTable::new();
        let weak = table.downgrade();
        assert!(weak.upgrade().is_some());

        drop(table);
        assert!(weak.upgrade().is_none());
    }

    #[tokio::test]
    async fn test_stats() {
        let table = MemoryTable::new();
        table.set("key1", text("v"), absolute(MINUTE)).await;
        table.try_get("key1", text_id()).await;
        table.try_get("missing", text_id()).await;
        // Existence probes are not reads
        table.contains_key("key1").await;

        let stats = table.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
