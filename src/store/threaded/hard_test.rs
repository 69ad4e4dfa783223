#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use crate::engine::{BTreeEngine, HashEngine};
    use crate::error::StoreError;
    use crate::store::{HardThreadedStore, KvStore, StoreOptions};

    fn store(partitions: usize) -> HardThreadedStore<BTreeEngine> {
        HardThreadedStore::new(StoreOptions::new(partitions).with_queue_capacity(1024)).unwrap()
    }

    #[test]
    fn test_read_write_round_trip() {
        let store = store(4);
        store.write("k", b"v").unwrap();
        assert_eq!(store.read("k").unwrap(), b"v");
    }

    #[test]
    fn test_read_missing_key() {
        let store = store(4);
        assert_eq!(store.read("k"), Err(StoreError::NotFound));
    }

    #[test]
    fn test_scan_fans_out_across_shards() {
        let store = store(4);
        for i in 0..12 {
            store
                .write(&format!("user:{i:02}"), format!("u{i}").as_bytes())
                .unwrap();
        }
        let rows = store.scan("user:", 12).unwrap();
        assert_eq!(rows.len(), 12);
        for (i, (k, v)) in rows.iter().enumerate() {
            assert_eq!(k, &format!("user:{i:02}"));
            assert_eq!(v, format!("u{i}").as_bytes());
        }
    }

    #[test]
    fn test_scan_respects_limit() {
        let store = store(4);
        for i in 0..10 {
            store.write(&format!("k{i}"), b"v").unwrap();
        }
        assert_eq!(store.scan("k", 3).unwrap().len(), 3);
    }

    #[test]
    fn test_repartition_keeps_unwritten_keys_readable() {
        let store = store(2);
        for i in 0..10 {
            store
                .write(&format!("k{i}"), format!("v{i}").as_bytes())
                .unwrap();
        }
        store.enable_tracking(true);
        let _ = store.scan("", 10);
        thread::sleep(Duration::from_millis(80));
        store.repartition();

        for i in 0..10 {
            assert_eq!(
                store.read(&format!("k{i}")).unwrap(),
                format!("v{i}").as_bytes()
            );
        }
    }

    #[test]
    fn test_works_with_unordered_engine() {
        let store: HardThreadedStore<HashEngine> =
            HardThreadedStore::new(StoreOptions::new(2).with_queue_capacity(256)).unwrap();
        for k in ["b", "a", "c"] {
            store.write(k, k.as_bytes()).unwrap();
        }
        let rows = store.scan("", 3).unwrap();
        let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
