//! `LRUCache<K, V>`: capacity-bounded cache with hit/miss stats.
//!
//! Backed by `indexmap::IndexMap` because its
//! insertion-order iteration gives a deterministic, cheap way to find the
//! least-recently-used entry once we re-insert on every touch (shift the
//! touched entry to the back by removing+reinserting).

use std::hash::Hash;

use indexmap::IndexMap as OrderedMap;

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub struct LRUCache<K, V> {
    capacity: usize,
    // Insertion-order == recency order, oldest (least-recently-used) first.
    entries: OrderedMap<K, V>,
    stats: CacheStats,
}

impl<K, V> LRUCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::CapacityZero);
        }
        Ok(LRUCache {
            capacity,
            entries: OrderedMap::with_capacity(capacity),
            stats: CacheStats::default(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Returns `Some(&V)` on hit and marks the entry most-recently-used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.entries.contains_key(key) {
            self.touch(key);
            self.stats.hits += 1;
            self.entries.get(key)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Peek without affecting recency or stats — used by callers that only
    /// want to know whether a fingerprint is already resident (e.g. the
    /// positioner deciding whether a mount will be a cache hit) without
    /// disturbing eviction order.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Inserts `value`, evicting the least-recently-used entry if the
    /// cache is at capacity and `key` is new. Returns the evicted pair, if
    /// any.
    pub fn put(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.entries.contains_key(&key) {
            self.entries.insert(key.clone(), value);
            self.touch(&key);
            return None;
        }
        let evicted = if self.entries.len() >= self.capacity {
            self.stats.evictions += 1;
            self.entries.shift_remove_index(0)
        } else {
            None
        };
        self.entries.insert(key, value);
        evicted
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Move `key` to the most-recently-used end by removing and
    /// reinserting it in place (`shift_remove` + push keeps relative order
    /// of everything else, which is what makes eviction deterministic).
    fn touch(&mut self, key: &K) {
        if let Some((_, v)) = self.entries.shift_remove_full(key).map(|(_, k, v)| (k, v)) {
            self.entries.insert(key.clone(), v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            LRUCache::<u32, u32>::new(0),
            Err(ConfigError::CapacityZero)
        ));
    }

    #[test]
    fn s5_eviction_order() {
        // S5: capacity 2. put(a), put(b), get(a), put(c) => evicted = b.
        let mut cache = LRUCache::new(2).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.get(&"a"), Some(&1));
        let evicted = cache.put("c", 3);
        assert_eq!(evicted, Some(("b", 2)));
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"c"), Some(&3));
        assert_eq!(cache.get(&"b"), None);
    }

    #[test]
    fn stats_track_hits_misses_evictions() {
        let mut cache = LRUCache::new(1).unwrap();
        cache.put(1, "x");
        cache.get(&1); // hit
        cache.get(&2); // miss
        cache.put(2, "y"); // evicts 1
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn get_returns_most_recent_put_soundness() {
        // Property 6: if get(k) returns v, v was the most recent put(k, _).
        let mut cache = LRUCache::new(4).unwrap();
        cache.put("k", 1);
        cache.put("k", 2);
        assert_eq!(cache.get(&"k"), Some(&2));
    }
}
