//! Insertion-ordered keyed storage
//!
//! Entities of one category are realized in registration order, so lookups go
//! through a hash index while iteration walks the insertion sequence.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Keyed collection that iterates in insertion order
#[derive(Debug, Clone)]
pub struct Registry<K, V> {
    entries: Vec<(K, V)>,
    index: HashMap<K, usize>,
}

impl<K: Hash + Eq + Clone, V> Registry<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&i| &mut self.entries[i].1)
    }

    /// Insert or replace. A replaced entry keeps its original position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&i) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[i].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    /// Insert or replace, returning the stored value
    pub fn upsert(&mut self, key: K, value: V) -> &mut V {
        let i = match self.index.get(&key) {
            Some(&i) => {
                self.entries[i].1 = value;
                i
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }

    /// Stored value for `key`, inserting `default()` at the end when absent
    pub fn get_or_insert_with(&mut self, key: K, default: impl FnOnce() -> V) -> &mut V {
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }

    /// Remove an entry, preserving the order of the rest
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let i = self.index.remove(key)?;
        let (_, value) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl<V> Registry<u32, V> {
    /// Next free tag: one past the largest key, or 1 when empty
    pub fn next_tag(&self) -> u32 {
        self.entries.iter().map(|(k, _)| *k).max().unwrap_or(0) + 1
    }
}

impl<K: Hash + Eq + Clone, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iterates_in_insertion_order() {
        let mut reg = Registry::new();
        reg.insert(5u32, "five");
        reg.insert(1, "one");
        reg.insert(3, "three");
        assert_eq!(reg.keys().copied().collect::<Vec<_>>(), vec![5, 1, 3]);
        assert_eq!(reg.next_tag(), 6);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut reg = Registry::new();
        reg.insert("a".to_string(), 1);
        reg.insert("b".to_string(), 2);
        assert_eq!(reg.insert("a".to_string(), 10), Some(1));
        assert_eq!(reg.values().copied().collect::<Vec<_>>(), vec![10, 2]);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut reg = Registry::new();
        for tag in 1u32..=4 {
            reg.insert(tag, tag * 10);
        }
        assert_eq!(reg.remove(&2), Some(20));
        assert_eq!(reg.get(&4), Some(&40));
        assert_eq!(reg.get(&3), Some(&30));
        assert!(reg.get(&2).is_none());
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.next_tag(), 5);
    }
}
