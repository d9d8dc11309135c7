//! Bounded cache of finished verifications

use std::collections::BTreeMap;
use std::time::SystemTime;

use super::cache_entry::CachedEntry;
use super::request_key::RequestKey;

/// Default number of cached verifications
pub const DEFAULT_CAPACITY: usize = 256;

/// Ordered, capacity-bounded map from request key to outcome.
///
/// Confined to the scheduler's owning context, so it takes `&mut self` and
/// needs no locking. When full, the least recently used entry is evicted.
/// A capacity of zero disables caching.
#[derive(Debug)]
pub struct RequestCache {
    entries: BTreeMap<RequestKey, CachedEntry>,
    capacity: usize,
    tick: u64,
    evictions: u64,
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RequestCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity,
            tick: 0,
            evictions: 0,
        }
    }

    /// The entry for `key` if `now` lies within its window
    pub fn get(&mut self, key: &RequestKey, now: SystemTime) -> Option<&CachedEntry> {
        self.tick += 1;
        let tick = self.tick;
        let entry = self.entries.get_mut(key)?;
        if !entry.is_valid_at(now) {
            tracing::trace!(
                target: "certverify::cache",
                hostname = key.hostname(),
                "Cached verification outside its window"
            );
            return None;
        }
        entry.touch(tick);
        Some(entry)
    }

    /// Insert or replace the entry for `key`, evicting if over capacity
    pub fn put(&mut self, key: RequestKey, mut entry: CachedEntry) {
        if self.capacity == 0 {
            return;
        }
        self.tick += 1;
        entry.set_last_used(self.tick);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_lru();
        }
        self.entries.insert(key, entry);
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(
                target: "certverify::cache",
                entries = self.entries.len(),
                "Clearing verification cache"
            );
        }
        self.entries.clear();
    }

    /// Drop entries whose window no longer covers `now`, returning how many
    pub fn remove_expired(&mut self, now: SystemTime) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_valid_at(now));
        before - self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries evicted for capacity since construction
    #[must_use]
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used())
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            self.evictions += 1;
            tracing::trace!(
                target: "certverify::cache",
                hostname = key.hostname(),
                "Evicted least recently used verification"
            );
        }
    }
}
