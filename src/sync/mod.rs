//! Synchronized container primitives.
//!
//! Registries, discovery logs and derived caches are shared between
//! worker threads without any external locking by callers. These two
//! wrappers keep the locking internal: [`SyncList`] is a guarded
//! sequence, [`SyncMap`] a guarded mapping with an atomic
//! get-or-compute-once operation.
//!
//! Iteration is by snapshot: callers clone the current contents and walk
//! the clone, so no lock is held across caller code.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

/// Thread-safe ordered sequence.
pub struct SyncList<T> {
    inner: RwLock<Vec<T>>,
}

impl<T: Clone> SyncList<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Append an element.
    pub fn push(&self, item: T) {
        self.inner.write().push(item);
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Element at `index`, if still in range.
    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.read().get(index).cloned()
    }

    /// Clone the current contents for lock-free iteration.
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.read().clone()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }
}

impl<T: Clone + PartialEq> SyncList<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.inner.read().contains(item)
    }

    /// Remove the first element equal to `item`. Returns whether one was
    /// found.
    pub fn remove_item(&self, item: &T) -> bool {
        let mut guard = self.inner.write();
        match guard.iter().position(|x| x == item) {
            Some(idx) => {
                guard.remove(idx);
                true
            }
            None => false,
        }
    }
}

impl<T: Clone> Default for SyncList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Thread-safe mapping with atomic insert-if-absent.
pub struct SyncMap<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> SyncMap<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read().contains_key(key)
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.write().insert(key, value)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Clone the current entries for lock-free iteration.
    pub fn snapshot(&self) -> Vec<(K, V)> {
        self.inner
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Return the value for `key`, computing and inserting it if absent.
    ///
    /// The initializer runs under the write lock, so for any given key it
    /// executes at most once even under concurrent callers, and every
    /// caller observes the same stored value.
    pub fn get_or_insert_with(&self, key: K, init: impl FnOnce() -> V) -> V {
        if let Some(v) = self.inner.read().get(&key) {
            return v.clone();
        }
        let mut guard = self.inner.write();
        guard.entry(key).or_insert_with(init).clone()
    }

    /// Fallible [`SyncMap::get_or_insert_with`]: a failing initializer
    /// inserts nothing, so the next caller retries.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        init: impl FnOnce() -> std::result::Result<V, E>,
    ) -> std::result::Result<V, E> {
        if let Some(v) = self.inner.read().get(&key) {
            return Ok(v.clone());
        }
        let mut guard = self.inner.write();
        if let Some(v) = guard.get(&key) {
            return Ok(v.clone());
        }
        let value = init()?;
        guard.insert(key, value.clone());
        Ok(value)
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for SyncMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_list_push_snapshot() {
        let list = SyncList::new();
        list.push(1);
        list.push(2);
        assert_eq!(list.snapshot(), vec![1, 2]);
        assert_eq!(list.get(1), Some(2));
        assert_eq!(list.get(5), None);
    }

    #[test]
    fn test_list_remove_item() {
        let list = SyncList::new();
        list.push("a");
        list.push("b");
        assert!(list.remove_item(&"a"));
        assert!(!list.remove_item(&"a"));
        assert_eq!(list.snapshot(), vec!["b"]);
    }

    #[test]
    fn test_map_basics() {
        let map = SyncMap::new();
        assert!(map.insert("k", 1).is_none());
        assert_eq!(map.insert("k", 2), Some(1));
        assert_eq!(map.get(&"k"), Some(2));
        assert_eq!(map.remove(&"k"), Some(2));
        assert!(map.is_empty());
    }

    #[test]
    fn test_get_or_insert_runs_once() {
        let map: Arc<SyncMap<u32, u32>> = Arc::new(SyncMap::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let map = Arc::clone(&map);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    map.get_or_insert_with(7, || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        42
                    })
                })
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
