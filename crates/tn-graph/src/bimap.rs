//! Bidirectional key/value map.
//!
//! Used by the dependency matrix to give every node a dense integer index
//! while still finding the index back from a `NodeId`.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::BiMapError;

/// One-to-one association between keys and values.
///
/// No two entries share a key or a value. A conflicting insert is rejected
/// and leaves both directions untouched.
#[derive(Debug, Clone)]
pub struct BiMap<K, V> {
    forward: HashMap<K, V>,
    reverse: HashMap<V, K>,
}

impl<K, V> Default for BiMap<K, V> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }
}

impl<K, V> BiMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K, val: V) -> Result<(), BiMapError> {
        if self.forward.contains_key(&key) {
            return Err(BiMapError::KeyConflict);
        }
        if self.reverse.contains_key(&val) {
            return Err(BiMapError::ValueConflict);
        }
        self.forward.insert(key.clone(), val.clone());
        self.reverse.insert(val, key);
        Ok(())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.forward.contains_key(key)
    }

    pub fn contains_val(&self, val: &V) -> bool {
        self.reverse.contains_key(val)
    }

    pub fn get_by_key(&self, key: &K) -> Option<&V> {
        self.forward.get(key)
    }

    pub fn get_by_val(&self, val: &V) -> Option<&K> {
        self.reverse.get(val)
    }

    /// Remove the entry for `key`; no-op if absent.
    pub fn delete_by_key(&mut self, key: &K) {
        if let Some(val) = self.forward.remove(key) {
            self.reverse.remove(&val);
        }
    }

    /// Remove the entry for `val`; no-op if absent.
    pub fn delete_by_val(&mut self, val: &V) {
        if let Some(key) = self.reverse.remove(val) {
            self.forward.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Single pass over all pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.forward.iter()
    }
}

impl<K, V> IntoIterator for BiMap<K, V> {
    type Item = (K, V);
    type IntoIter = std::collections::hash_map::IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.forward.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_lookup_both_ways() {
        let mut map = BiMap::new();
        map.add(0usize, "inlet").unwrap();
        map.add(1, "outlet").unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get_by_key(&1), Some(&"outlet"));
        assert_eq!(map.get_by_val(&"inlet"), Some(&0));
        assert_eq!(map.get_by_key(&7), None);
        assert_eq!(map.get_by_val(&"missing"), None);
    }

    #[test]
    fn conflicts_leave_map_unchanged() {
        let mut map = BiMap::new();
        map.add(0usize, 'a').unwrap();

        assert_eq!(map.add(0, 'b'), Err(BiMapError::KeyConflict));
        assert_eq!(map.add(1, 'a'), Err(BiMapError::ValueConflict));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_val(&'b'));
        assert!(!map.contains_key(&1));
    }

    #[test]
    fn delete_clears_both_sides() {
        let mut map = BiMap::new();
        map.add(0usize, 'a').unwrap();
        map.add(1, 'b').unwrap();

        map.delete_by_key(&0);
        assert!(!map.contains_key(&0));
        assert!(!map.contains_val(&'a'));

        map.delete_by_val(&'b');
        assert!(!map.contains_key(&1));
        assert!(!map.contains_val(&'b'));
        assert!(map.is_empty());

        // Absent entries are a no-op.
        map.delete_by_key(&42);
        map.delete_by_val(&'z');
        assert!(map.is_empty());
    }

    #[test]
    fn iteration_visits_each_pair_once() {
        let mut map = BiMap::new();
        for i in 0..5usize {
            map.add(i, i * 10).unwrap();
        }
        let mut pairs: Vec<(usize, usize)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        pairs.sort();
        assert_eq!(pairs, vec![(0, 0), (1, 10), (2, 20), (3, 30), (4, 40)]);

        let owned: Vec<_> = map.into_iter().collect();
        assert_eq!(owned.len(), 5);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn both_directions_stay_consistent(ops in prop::collection::vec((0u8..16, 0u8..16, 0u8..3), 0..64)) {
            let mut map: BiMap<u8, u8> = BiMap::new();
            for (k, v, op) in ops {
                match op {
                    0 => {
                        map.delete_by_key(&k);
                        prop_assert!(!map.contains_key(&k));
                    }
                    1 => {
                        map.delete_by_val(&v);
                        prop_assert!(!map.contains_val(&v));
                    }
                    _ => {
                        let _ = map.add(k, v);
                    }
                }
                for (key, val) in map.iter() {
                    prop_assert_eq!(map.get_by_val(val), Some(key));
                }
                prop_assert_eq!(map.forward.len(), map.reverse.len());
            }
        }
    }
}
