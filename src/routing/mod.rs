//! Ordered key routing maps.

pub mod btree_map;

#[cfg(test)]
mod btree_map_test;

pub use btree_map::BTreeKeyMap;

/// Ordered map from keys to routing values (shard ids or engine handles).
///
/// Insertion order is irrelevant; iteration order is strict byte-wise key
/// order. `lower_bound` drives range scans: it yields entries from the least
/// key not less than the probe.
pub trait KeyMap<V: Clone> {
    type Iter<'a>: Iterator<Item = (&'a String, &'a V)>
    where
        Self: 'a,
        V: 'a;

    /// Looks up the value for `key`.
    fn get(&self, key: &str) -> Option<V>;

    /// Inserts or replaces the value for `key`.
    fn put(&mut self, key: &str, value: V);

    /// Returns the existing value for `key`, or inserts `value` and returns
    /// it. The flag is `true` when the key was already present.
    fn get_or_insert(&mut self, key: &str, value: V) -> (V, bool);

    /// Iterates entries in key order starting at the least key >= `key`.
    fn lower_bound(&self, key: &str) -> Self::Iter<'_>;

    /// Number of routed keys.
    fn len(&self) -> usize;

    /// Checks whether the map holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
