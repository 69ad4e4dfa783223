#[cfg(test)]
mod tests {
    use crate::routing::{BTreeKeyMap, KeyMap};

    #[test]
    fn test_get_put_replace() {
        let mut map: BTreeKeyMap<usize> = BTreeKeyMap::new();
        assert_eq!(map.get("a"), None);
        map.put("a", 1);
        assert_eq!(map.get("a"), Some(1));
        map.put("a", 2);
        assert_eq!(map.get("a"), Some(2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_get_or_insert_reports_presence() {
        let mut map: BTreeKeyMap<usize> = BTreeKeyMap::new();
        assert_eq!(map.get_or_insert("k", 3), (3, false));
        assert_eq!(map.get_or_insert("k", 9), (3, true));
        assert_eq!(map.get("k"), Some(3));
    }

    #[test]
    fn test_lower_bound_starts_at_least_key_not_less() {
        let mut map: BTreeKeyMap<usize> = BTreeKeyMap::new();
        for (k, v) in [("b", 1), ("d", 2), ("f", 3)] {
            map.put(k, v);
        }
        let keys: Vec<&str> = map.lower_bound("c").map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["d", "f"]);

        // Exact hit starts at the key itself.
        let keys: Vec<&str> = map.lower_bound("b").map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "d", "f"]);
    }

    #[test]
    fn test_lower_bound_past_end_is_empty() {
        let mut map: BTreeKeyMap<usize> = BTreeKeyMap::new();
        map.put("a", 0);
        assert_eq!(map.lower_bound("z").count(), 0);
    }

    #[test]
    fn test_iteration_is_byte_ordered() {
        let mut map: BTreeKeyMap<usize> = BTreeKeyMap::new();
        for k in ["user:11", "user:2", "product:9", "user:1"] {
            map.put(k, 0);
        }
        let keys: Vec<&str> = map.lower_bound("").map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["product:9", "user:1", "user:11", "user:2"]);
    }
}
