//! Fixed-capacity LRU caches, one per configured category.
//!
//! The relay keeps a handful of small caches (fetched actor documents,
//! resolved objects, digest lookups) whose sizes are set independently
//! in configuration. Capacity is fixed at construction and eviction is
//! strictly least-recently-used: a `get` promotes the key, an `insert`
//! at capacity drops the coldest entry. There is no TTL and no
//! invalidation beyond capacity pressure.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// LRU cache with a capacity fixed at construction.
#[derive(Debug)]
pub struct BoundedCache<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    cap: usize,
    inner: RwLock<Inner<K, V>>,
}

#[derive(Debug)]
struct Inner<K, V> {
    map: HashMap<K, V>,
    // front = most-recent, back = least-recent
    lru: VecDeque<K>,
}

impl<K, V> BoundedCache<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    /// Capacity of zero means the cache stores nothing.
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            inner: RwLock::new(Inner {
                map: HashMap::new(),
                lru: VecDeque::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().map.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read().map.contains_key(key)
    }

    /// Get a clone without moving the LRU position.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.read().map.get(key).cloned()
    }

    /// Get and bump LRU.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.write();
        if inner.map.contains_key(key) {
            if let Some(pos) = inner.lru.iter().position(|k| k == key) {
                inner.lru.remove(pos);
            }
            inner.lru.push_front(key.clone());
            inner.map.get(key).cloned()
        } else {
            None
        }
    }

    /// Insert or update (LRU-aware), evicting the coldest entry at capacity.
    pub fn insert(&self, key: K, value: V) {
        if self.cap == 0 {
            return;
        }

        let mut inner = self.inner.write();
        if inner.map.contains_key(&key) {
            inner.map.insert(key.clone(), value);
            if let Some(pos) = inner.lru.iter().position(|k| k == &key) {
                inner.lru.remove(pos);
            }
            inner.lru.push_front(key);
            return;
        }

        if inner.map.len() >= self.cap
            && let Some(old) = inner.lru.pop_back()
        {
            inner.map.remove(&old);
        }

        inner.lru.push_front(key.clone());
        inner.map.insert(key, value);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.map.clear();
        inner.lru.clear();
    }
}

/// The relay's caches keyed by category name.
///
/// Categories and capacities come from configuration and are fixed for
/// the life of the process; nothing resizes or adds categories at
/// runtime.
#[derive(Debug)]
pub struct CacheRegistry {
    caches: HashMap<String, BoundedCache<String, Value>>,
}

impl CacheRegistry {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let caches = categories
            .into_iter()
            .map(|(name, cap)| (name.into(), BoundedCache::new(cap)))
            .collect();
        Self { caches }
    }

    pub fn get(&self, category: &str) -> Option<&BoundedCache<String, Value>> {
        self.caches.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.caches.keys().map(String::as_str)
    }
}
