//! `BTreeMap`-backed routing map.

use std::collections::btree_map;
use std::collections::BTreeMap;

use super::KeyMap;

/// Ordered routing map over `std::collections::BTreeMap`.
#[derive(Debug, Default)]
pub struct BTreeKeyMap<V> {
    inner: BTreeMap<String, V>,
}

impl<V> BTreeKeyMap<V> {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }
}

impl<V: Clone> KeyMap<V> for BTreeKeyMap<V> {
    type Iter<'a>
        = btree_map::Range<'a, String, V>
    where
        Self: 'a,
        V: 'a;

    fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: V) {
        self.inner.insert(key.to_string(), value);
    }

    fn get_or_insert(&mut self, key: &str, value: V) -> (V, bool) {
        match self.inner.get(key) {
            Some(existing) => (existing.clone(), true),
            None => {
                self.inner.insert(key.to_string(), value.clone());
                (value, false)
            }
        }
    }

    fn lower_bound(&self, key: &str) -> Self::Iter<'_> {
        self.inner.range(key.to_string()..)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
