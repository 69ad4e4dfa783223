#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use crate::engine::{BTreeEngine, StorageEngine};
    use crate::store::threaded::{OpStatus, Operation, PartitionWorker, ReadOp, ScanOp, WriteOp};

    fn engine() -> Arc<BTreeEngine> {
        Arc::new(BTreeEngine::open(0, Path::new("/tmp")).unwrap())
    }

    #[test]
    fn test_soft_worker_serves_write_then_read() {
        let engine = engine();
        let worker = PartitionWorker::spawn_soft(0, Arc::clone(&engine), 64);

        worker.enqueue(Operation::Write(WriteOp {
            key: "a".to_string(),
            value: b"1".to_vec(),
            engine: None,
        }));
        let read = ReadOp::new("a", None);
        worker.enqueue(Operation::Read(Arc::clone(&read)));

        let (status, value) = read.completion.wait();
        assert_eq!(status, OpStatus::Success);
        assert_eq!(value, b"1");
    }

    #[test]
    fn test_soft_worker_read_missing_key() {
        let worker = PartitionWorker::spawn_soft(0, engine(), 64);
        let read = ReadOp::new("missing", None);
        worker.enqueue(Operation::Read(Arc::clone(&read)));
        let (status, value) = read.completion.wait();
        assert_eq!(status, OpStatus::NotFound);
        assert!(value.is_empty());
    }

    #[test]
    fn test_soft_worker_scan_coordinator_fills_results() {
        let engine = engine();
        for k in ["a", "b", "c"] {
            engine.write(k, k.as_bytes()).unwrap();
        }
        let worker = PartitionWorker::spawn_soft(0, Arc::clone(&engine), 64);

        let scan: Arc<ScanOp<BTreeEngine>> = ScanOp::single_engine("a", 2, 1);
        worker.enqueue(Operation::Scan(Arc::clone(&scan)));

        assert_eq!(scan.completion.wait(), OpStatus::Success);
        let rows = scan.take_results();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "a");
        assert_eq!(rows[1].0, "b");
    }

    #[test]
    fn test_hard_worker_uses_carried_engine_handles() {
        let engine_a = engine();
        let engine_b = engine();
        engine_a.write("k0", b"from-a").unwrap();
        engine_b.write("k1", b"from-b").unwrap();

        let worker0 = PartitionWorker::spawn_hard(0, 64);
        let worker1 = PartitionWorker::spawn_hard(1, 64);

        let scan = ScanOp::fanned_out(
            "k",
            2,
            vec!["k0".to_string(), "k1".to_string()],
            vec![0, 1],
            vec![Arc::clone(&engine_a), Arc::clone(&engine_b)],
            2,
        );
        worker0.enqueue(Operation::Scan(Arc::clone(&scan)));
        worker1.enqueue(Operation::Scan(Arc::clone(&scan)));

        assert_eq!(scan.completion.wait(), OpStatus::Success);
        let rows = scan.take_results();
        assert_eq!(rows[0], ("k0".to_string(), b"from-a".to_vec()));
        assert_eq!(rows[1], ("k1".to_string(), b"from-b".to_vec()));
    }

    #[test]
    fn test_hard_worker_scan_records_missing_slot() {
        let engine_a = engine();
        engine_a.write("k0", b"v").unwrap();

        let worker = PartitionWorker::spawn_hard(0, 64);
        let scan = ScanOp::fanned_out(
            "k",
            2,
            vec!["k0".to_string(), "k1".to_string()],
            vec![0, 0],
            vec![Arc::clone(&engine_a), Arc::clone(&engine_a)],
            1,
        );
        worker.enqueue(Operation::Scan(Arc::clone(&scan)));
        assert_eq!(scan.completion.wait(), OpStatus::NotFound);
    }

    #[test]
    fn test_worker_serves_fifo_before_stopping() {
        let engine = engine();
        {
            let worker = PartitionWorker::spawn_soft(0, Arc::clone(&engine), 1024);
            for i in 0..100 {
                worker.enqueue(Operation::Write(WriteOp {
                    key: format!("k{i:03}"),
                    value: vec![b'v'],
                    engine: None,
                }));
            }
            // Dropping the worker runs the Done handshake behind the queue.
        }
        for i in 0..100 {
            assert_eq!(engine.read(&format!("k{i:03}")).unwrap(), vec![b'v']);
        }
    }
}
