//! Bounded insertion-order cache of decoded values.
//!
//! Eviction is by insertion age, not access recency: a lookup never moves an
//! entry, and the oldest inserted key is the first to go once the cache is
//! full. Re-inserting a key that is already cached replaces its value in
//! place and keeps its original position, so it neither evicts anything nor
//! becomes "newest".
//!
//! The cache is never authoritative. Dropping any entry at any time only
//! costs a durable read.

use crate::constants::DEFAULT_CACHE_SIZE;
use indexmap::IndexMap;

/// Fixed-capacity mapping from logical key to decoded value.
#[derive(Debug, Clone)]
pub struct RecencyCache<V> {
    /// Oldest inserted first.
    entries: IndexMap<String, V>,
    capacity: usize,
}

impl<V: Clone> RecencyCache<V> {
    /// Creates an empty cache holding at most `capacity` entries.
    ///
    /// A capacity of zero disables caching. Storage grows on demand past the
    /// default size, so a large bound costs nothing up front.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity.min(DEFAULT_CACHE_SIZE)),
            capacity,
        }
    }

    /// Inserts `value` under `key`.
    ///
    /// Returns the key evicted to make room, if any.
    pub fn insert(&mut self, key: &str, value: V) -> Option<String> {
        if self.capacity == 0 {
            return None;
        }

        if let Some(slot) = self.entries.get_mut(key) {
            *slot = value;
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0).map(|(oldest, _)| oldest)
        } else {
            None
        };

        self.entries.insert(key.to_string(), value);
        evicted
    }

    /// Returns a clone of the cached value without touching eviction order.
    pub fn lookup(&self, key: &str) -> Option<V> {
        self.entries.get(key).cloned()
    }

    /// Returns true if `key` is cached.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Drops `key` from the cache, keeping the order of the rest.
    ///
    /// Returns the value that was cached, if any.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.shift_remove(key)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached keys from oldest to newest.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut cache = RecencyCache::new(2);
        cache.insert("a", 1);

        assert_eq!(cache.lookup("a"), Some(1));
        assert_eq!(cache.lookup("b"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_oldest_inserted() {
        let mut cache = RecencyCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);

        let evicted = cache.insert("c", 3);
        assert_eq!(evicted.as_deref(), Some("a"));
        assert!(!cache.contains("a"));
        assert_eq!(cache.keys().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_lookup_does_not_refresh() {
        let mut cache = RecencyCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);

        // A true LRU would keep "a" after this read.
        assert_eq!(cache.lookup("a"), Some(1));
        cache.insert("c", 3);

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut cache = RecencyCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);

        assert_eq!(cache.insert("a", 10), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup("a"), Some(10));

        // "a" is still the oldest.
        assert_eq!(cache.insert("c", 3).as_deref(), Some("a"));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut cache = RecencyCache::new(30);
        for i in 0..100 {
            cache.insert(&format!("key:{i}"), i);
            assert!(cache.len() <= 30);
        }
        assert_eq!(cache.len(), 30);
        assert!(cache.contains("key:99"));
        assert!(!cache.contains("key:69"));
        assert!(cache.contains("key:70"));
    }

    #[test]
    fn test_zero_capacity_caches_nothing() {
        let mut cache = RecencyCache::new(0);
        assert_eq!(cache.insert("a", 1), None);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 0);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cache = RecencyCache::new(3);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);

        assert_eq!(cache.remove("b"), Some(2));
        assert_eq!(cache.remove("b"), None);
        assert_eq!(cache.keys().collect::<Vec<_>>(), vec!["a", "c"]);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.keys().count(), 0);
    }

    #[test]
    fn test_huge_capacity_does_not_preallocate() {
        let mut cache = RecencyCache::new(usize::MAX);
        assert_eq!(cache.capacity(), usize::MAX);

        for i in 0..100 {
            assert_eq!(cache.insert(&format!("key:{i}"), i), None);
        }
        assert_eq!(cache.len(), 100);
        assert_eq!(cache.keys().next(), Some("key:0"));
    }

    #[test]
    fn test_remove_then_evict_skips_removed_key() {
        let mut cache = RecencyCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.remove("a");

        assert_eq!(cache.insert("c", 3), None);
        assert_eq!(cache.insert("d", 4).as_deref(), Some("b"));
        assert_eq!(cache.keys().collect::<Vec<_>>(), vec!["c", "d"]);
    }
}
