//! Access Order Module
//!
//! Least-recently-used ordering for the bounded in-memory table.

use std::collections::{BTreeMap, HashMap};

// == Access Order ==
/// Tracks key recency with a monotonically increasing tick per access.
///
/// `by_tick` is ordered oldest first, so eviction pops its first entry.
#[derive(Debug, Default)]
pub struct AccessOrder {
    tick: u64,
    by_key: HashMap<String, u64>,
    by_tick: BTreeMap<u64, String>,
}

impl AccessOrder {
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks `key` as most recently used, inserting it if unknown.
    pub fn touch(&mut self, key: &str) {
        self.tick += 1;
        if let Some(previous) = self.by_key.insert(key.to_string(), self.tick) {
            self.by_tick.remove(&previous);
        }
        self.by_tick.insert(self.tick, key.to_string());
    }

    // == Forget ==
    /// Stops tracking `key`. Unknown keys are ignored.
    pub fn forget(&mut self, key: &str) {
        if let Some(tick) = self.by_key.remove(key) {
            self.by_tick.remove(&tick);
        }
    }

    // == Pop Oldest ==
    /// Removes and returns the least recently used key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        let (_, key) = self.by_tick.pop_first()?;
        self.by_key.remove(&key);
        Some(key)
    }

    #[cfg(test)]
    pub(crate) fn oldest(&self) -> Option<&str> {
        self.by_tick.values().next().map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }
}
