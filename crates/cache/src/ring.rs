// Path: crates/cache/src/ring.rs
//! A clock-order eviction ring bounding a [`dashmap::DashMap`] to a fixed
//! capacity without pulling in a dedicated `lru` dependency, following the
//! teacher's existing `DashMap`-as-concurrent-store idiom
//! (`execution/src/mv_memory.rs`) plus the simplest possible bound on top of
//! it: a FIFO of keys, oldest evicted first once capacity is exceeded.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::hash::Hash;
use std::sync::Mutex;

pub struct BoundedCache<K, V> {
    capacity: usize,
    map: DashMap<K, V>,
    order: Mutex<VecDeque<K>>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), map: DashMap::new(), order: Mutex::new(VecDeque::new()) }
    }

    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    /// Inserts `value` under `key`, evicting the oldest entry if this insert
    /// pushes the cache over capacity. A re-insert of an already-present key
    /// doesn't grow the order queue.
    pub fn insert(&self, key: K, value: V) {
        let is_new = !self.map.contains_key(&key);
        self.map.insert(key.clone(), value);
        if !is_new {
            return;
        }
        let mut order = self.order.lock().unwrap_or_else(|p| p.into_inner());
        order.push_back(key);
        if order.len() > self.capacity {
            if let Some(evicted) = order.pop_front() {
                self.map.remove(&evicted);
            }
        }
    }

    pub fn invalidate_all(&self) {
        self.map.clear();
        self.order.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_once_over_capacity() {
        let cache: BoundedCache<u32, &str> = BoundedCache::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&1).is_none());
        assert_eq!(cache.get(&3), Some("c"));
    }

    #[test]
    fn reinserting_an_existing_key_does_not_evict() {
        let cache: BoundedCache<u32, &str> = BoundedCache::new(1);
        cache.insert(1, "a");
        cache.insert(1, "a2");
        assert_eq!(cache.get(&1), Some("a2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_all_clears_everything() {
        let cache: BoundedCache<u32, &str> = BoundedCache::new(4);
        cache.insert(1, "a");
        cache.invalidate_all();
        assert_eq!(cache.len(), 0);
    }
}
