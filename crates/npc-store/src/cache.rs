//! Bounded LRU cache with per-entry TTL fronting [`crate::postgres::PostgresPool`]
//! for hot reads (spec §4.2).
//!
//! Capacity 5000 entries, TTL 300 s by default; O(1) get/put via an intrusive
//! doubly-linked list threaded through the hash map's own entries (the
//! teacher workspace's hot tier is an external Redis-compatible store, so
//! this structure has no direct teacher analog — see `DESIGN.md`).

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Default entry capacity (spec §4.2).
pub const DEFAULT_CAPACITY: usize = 5000;
/// Default per-entry TTL (spec §4.2).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct Entry<K, V> {
    value: V,
    inserted_at: Instant,
    prev: Option<K>,
    next: Option<K>,
}

/// A bounded, TTL-expiring, least-recently-used cache.
pub struct Cache<K, V> {
    capacity: usize,
    ttl: Duration,
    map: HashMap<K, Entry<K, V>>,
    head: Option<K>,
    tail: Option<K>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
{
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            map: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Number of live entries, including any not-yet-swept expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Fetch a value, refreshing its recency. Returns `None` on miss or if
    /// the entry has outlived its TTL (the expired entry is evicted).
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let expired = self
            .map
            .get(key)
            .is_some_and(|entry| entry.inserted_at.elapsed() > self.ttl);
        if expired {
            self.remove(key);
            return None;
        }
        if self.map.contains_key(key) {
            self.touch(key);
        }
        self.map.get(key).map(|entry| &entry.value)
    }

    /// Insert or overwrite a value, evicting the least-recently-used entry
    /// if the cache is at capacity.
    pub fn put(&mut self, key: K, value: V) {
        if self.map.contains_key(&key) {
            self.remove(&key);
        } else if self.map.len() >= self.capacity {
            if let Some(lru) = self.tail.clone() {
                self.remove(&lru);
            }
        }

        let old_head = self.head.clone();
        self.map.insert(
            key.clone(),
            Entry {
                value,
                inserted_at: Instant::now(),
                prev: None,
                next: old_head.clone(),
            },
        );
        if let Some(old_head) = old_head {
            if let Some(entry) = self.map.get_mut(&old_head) {
                entry.prev = Some(key.clone());
            }
        }
        self.head = Some(key.clone());
        if self.tail.is_none() {
            self.tail = Some(key);
        }
    }

    /// Drop an entry regardless of TTL. Called on every write-through from
    /// the durable store (spec §4.2).
    pub fn invalidate(&mut self, key: &K) {
        self.remove(key);
    }

    fn touch(&mut self, key: &K) {
        if self.head.as_ref() == Some(key) {
            return;
        }
        let (prev, next) = match self.map.get(key) {
            Some(entry) => (entry.prev.clone(), entry.next.clone()),
            None => return,
        };
        if let Some(prev) = &prev {
            if let Some(entry) = self.map.get_mut(prev) {
                entry.next = next.clone();
            }
        }
        if let Some(next) = &next {
            if let Some(entry) = self.map.get_mut(next) {
                entry.prev = prev.clone();
            }
        } else {
            self.tail = prev;
        }

        let old_head = self.head.clone();
        if let Some(entry) = self.map.get_mut(key) {
            entry.prev = None;
            entry.next = old_head.clone();
        }
        if let Some(old_head) = old_head {
            if let Some(entry) = self.map.get_mut(&old_head) {
                entry.prev = Some(key.clone());
            }
        }
        self.head = Some(key.clone());
    }

    fn remove(&mut self, key: &K) {
        let Some(entry) = self.map.remove(key) else {
            return;
        };
        match &entry.prev {
            Some(prev) => {
                if let Some(prev_entry) = self.map.get_mut(prev) {
                    prev_entry.next = entry.next.clone();
                }
            }
            None => self.head = entry.next.clone(),
        }
        match &entry.next {
            Some(next) => {
                if let Some(next_entry) = self.map.get_mut(next) {
                    next_entry.prev = entry.prev.clone();
                }
            }
            None => self.tail = entry.prev.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let mut cache: Cache<&str, u32> = Cache::new(2, Duration::from_secs(60));
        cache.put("a", 1);
        assert_eq!(cache.get(&"a"), Some(&1));
    }

    #[test]
    fn evicts_least_recently_used_when_over_capacity() {
        let mut cache: Cache<&str, u32> = Cache::new(2, Duration::from_secs(60));
        cache.put("a", 1);
        cache.put("b", 2);
        // touch "a" so "b" becomes the LRU entry
        assert_eq!(cache.get(&"a"), Some(&1));
        cache.put("c", 3);
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn expired_entries_are_treated_as_misses() {
        let mut cache: Cache<&str, u32> = Cache::new(8, Duration::from_millis(1));
        cache.put("a", 1);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn invalidate_removes_regardless_of_ttl() {
        let mut cache: Cache<&str, u32> = Cache::new(8, Duration::from_secs(60));
        cache.put("a", 1);
        cache.invalidate(&"a");
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn overwriting_a_key_keeps_len_stable() {
        let mut cache: Cache<&str, u32> = Cache::new(8, Duration::from_secs(60));
        cache.put("a", 1);
        cache.put("a", 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a"), Some(&2));
    }
}
