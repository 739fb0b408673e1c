//! Access-ordered map with a pluggable eviction predicate.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;

/// Decides whether the eldest entry is evicted, given the map length after an insert.
pub type EvictPredicate<K, V> = Box<dyn Fn(&K, &V, usize) -> bool + Send + Sync>;

struct Entry<V> {
    value: V,
    tick: u64,
}

/// A map that remembers access order.
///
/// `get` and `insert` move an entry to the most recently used position. After
/// every insert the eviction predicate is asked about the eldest entry.
pub struct LruCacheMap<K, V> {
    entries: HashMap<K, Entry<V>>,
    order: BTreeMap<u64, K>,
    tick: u64,
    evict: EvictPredicate<K, V>,
}

impl<K: Hash + Eq + Clone, V> LruCacheMap<K, V> {
    /// Creates a map with a custom eviction predicate.
    pub fn new(evict: impl Fn(&K, &V, usize) -> bool + Send + Sync + 'static) -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            tick: 0,
            evict: Box::new(evict),
        }
    }

    /// Creates a map that evicts once its length reaches `max_size`.
    pub fn with_max_size(max_size: usize) -> Self {
        Self::new(move |_, _, len| len >= max_size)
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn touch(&mut self, key: &K) {
        let tick = self.next_tick();
        if let Some(entry) = self.entries.get_mut(key) {
            self.order.remove(&entry.tick);
            entry.tick = tick;
            self.order.insert(tick, key.clone());
        }
    }

    /// Returns a value and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.touch(key);
        self.entries.get(key).map(|e| &e.value)
    }

    /// Returns a value without changing the access order.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let tick = self.next_tick();
        let previous = self.entries.insert(key.clone(), Entry { value, tick });
        if let Some(old) = &previous {
            self.order.remove(&old.tick);
        }
        self.order.insert(tick, key);
        self.evict_eldest();
        previous.map(|e| e.value)
    }

    /// Returns a copy of the value for `key`, inserting the result of `f` if absent.
    ///
    /// The value is returned even if the eviction predicate drops it at once.
    pub fn get_or_insert_with(&mut self, key: K, f: impl FnOnce() -> V) -> V
    where
        V: Clone,
    {
        if let Some(value) = self.get(&key) {
            return value.clone();
        }
        let value = f();
        self.insert(key, value.clone());
        value
    }

    /// Removes an entry.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.tick);
        Some(entry.value)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.values()
    }

    fn evict_eldest(&mut self) {
        let Some((&tick, key)) = self.order.first_key_value() else {
            return;
        };
        let len = self.entries.len();
        let Some(entry) = self.entries.get(key) else {
            return;
        };
        if (self.evict)(key, &entry.value, len) {
            if let Some(key) = self.order.remove(&tick) {
                self.entries.remove(&key);
            }
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for LruCacheMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCacheMap")
            .field("len", &self.entries.len())
            .field("order", &self.order.values().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_size_keeps_one_less() {
        let mut map = LruCacheMap::with_max_size(3);
        map.insert(1, "a");
        map.insert(2, "b");
        assert_eq!(map.len(), 2);
        map.insert(3, "c");
        assert_eq!(map.len(), 2);
        assert!(!map.contains_key(&1));
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_get_refreshes_order() {
        let mut map = LruCacheMap::with_max_size(3);
        map.insert("x", 1);
        map.insert("y", 2);
        assert_eq!(map.get(&"x"), Some(&1));
        map.insert("z", 3);
        assert!(map.contains_key(&"x"));
        assert!(!map.contains_key(&"y"));
    }

    #[test]
    fn test_peek_keeps_order() {
        let mut map = LruCacheMap::with_max_size(3);
        map.insert("x", 1);
        map.insert("y", 2);
        assert_eq!(map.peek(&"x"), Some(&1));
        map.insert("z", 3);
        assert!(!map.contains_key(&"x"));
    }

    #[test]
    fn test_custom_predicate_sees_eldest() {
        let mut map = LruCacheMap::new(|key: &i32, _: &&str, _| *key < 0);
        map.insert(-1, "negative");
        assert!(map.is_empty());
        map.insert(5, "kept");
        map.insert(6, "kept");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_get_or_insert_with_and_remove() {
        let mut map = LruCacheMap::with_max_size(16);
        let mut calls = 0;
        assert_eq!(map.get_or_insert_with(1, || { calls += 1; 10 }), 10);
        assert_eq!(map.get_or_insert_with(1, || { calls += 1; 20 }), 10);
        assert_eq!(calls, 1);
        assert_eq!(map.remove(&1), Some(10));
        assert!(map.is_empty());
        map.insert(2, 2);
        map.clear();
        assert_eq!(map.len(), 0);
    }
}
