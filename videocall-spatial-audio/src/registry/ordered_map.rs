use std::borrow::Borrow;
use std::cmp::Ord;
use std::collections::HashMap;
use std::hash::Hash;

/// A `HashMap` that also keeps its keys sorted, so iteration order depends
/// only on the key set and never on insertion order.
#[derive(Debug)]
pub struct HashMapWithOrderedKeys<K: Ord, V> {
    map: HashMap<K, V>,
    keys: Vec<K>,
}

impl<K: Ord + Hash + Clone, V> HashMapWithOrderedKeys<K, V> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            keys: vec![],
        }
    }

    //
    // Delegated methods
    //

    pub fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(k)
    }

    pub fn contains_key<Q>(&self, k: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(k)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    //
    // Delegated methods with extra handling to maintain ordered keys
    //

    pub fn insert(&mut self, k: K, v: V) -> Option<V> {
        if let Err(index) = self.keys.binary_search(&k) {
            self.keys.insert(index, k.clone());
        }
        self.map.insert(k, v)
    }

    pub fn remove(&mut self, k: &K) -> Option<V> {
        if let Ok(index) = self.keys.binary_search(k) {
            self.keys.remove(index);
        }
        self.map.remove(k)
    }

    //
    // Ordered access
    //

    pub fn ordered_keys(&self) -> &[K] {
        &self.keys
    }

    /// Entries in ascending key order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.keys
            .iter()
            .filter_map(move |k| self.map.get(k).map(|v| (k, v)))
    }
}

impl<K: Ord + Hash + Clone, V> Default for HashMapWithOrderedKeys<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
