#[cfg(test)]
mod tests {
    use crate::engine::BTreeEngine;
    use crate::error::StoreError;
    use crate::store::{KvStore, SoftStore, StoreOptions};

    fn store(partitions: usize) -> SoftStore<BTreeEngine> {
        SoftStore::new(StoreOptions::new(partitions)).unwrap()
    }

    #[test]
    fn test_rejects_zero_partitions() {
        assert!(matches!(
            SoftStore::<BTreeEngine>::new(StoreOptions::new(0)),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_read_write_round_trip() {
        let store = store(4);
        store.write("k", b"v").unwrap();
        assert_eq!(store.read("k").unwrap(), b"v");
    }

    #[test]
    fn test_read_unrouted_key_is_not_found() {
        let store = store(4);
        store.write("other", b"v").unwrap();
        assert_eq!(store.read("k"), Err(StoreError::NotFound));
    }

    #[test]
    fn test_scan_collects_across_shards() {
        let store = store(4);
        for (k, v) in [("a", "1"), ("b", "2"), ("c", "3")] {
            store.write(k, v.as_bytes()).unwrap();
        }
        let rows = store.scan("", 10).unwrap();
        let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_repartition_without_tracked_data_keeps_routing() {
        let store = store(4);
        store.write("k", b"v").unwrap();
        store.repartition();
        assert_eq!(store.read("k").unwrap(), b"v");
    }

    #[test]
    fn test_single_partition_store_works() {
        let store = store(1);
        store.write("k", b"v").unwrap();
        assert_eq!(store.read("k").unwrap(), b"v");
        assert_eq!(store.scan("", 5).unwrap().len(), 1);
    }
}
