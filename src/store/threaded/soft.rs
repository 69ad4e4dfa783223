//! Worker-threaded store over a single shared engine.

use parking_lot::{MutexGuard, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::info;

use crate::engine::StorageEngine;
use crate::error::{StoreError, StoreResult};
use crate::graph::AccessGraph;
use crate::hash::KeyHasher;
use crate::routing::{BTreeKeyMap, KeyMap};
use crate::store::repartition::{spawn_repartition_loop, LoopGate};
use crate::store::{hash_shard, KvStore, StoreOptions};
use crate::tracker::Tracker;

use super::operation::{Operation, ReadOp, ScanOp, SyncOp, WriteOp};
use super::worker::PartitionWorker;

/// Soft-threaded flavor: one engine, one worker thread per shard.
///
/// The routing-table lock is the only lock on the request path; each key is
/// steered to exactly one worker, whose queue serializes every operation on
/// that shard. Repartitioning swaps the routing table and fences in-flight
/// work with a Sync operation across all workers.
pub struct SoftThreadedStore<E: StorageEngine> {
    inner: Arc<SoftThreadedInner<E>>,
    gate: Arc<LoopGate>,
    repartition_loop: Option<thread::JoinHandle<()>>,
}

struct SoftThreadedInner<E: StorageEngine> {
    partition_count: usize,
    hasher: Arc<dyn KeyHasher>,
    engine: Arc<E>,
    key_map: RwLock<BTreeKeyMap<usize>>,
    workers: Vec<PartitionWorker<E>>,
    tracker: Tracker,
    tracking: AtomicBool,
    repartitioning: AtomicBool,
}

impl<E: StorageEngine> SoftThreadedStore<E> {
    pub fn new(options: StoreOptions) -> StoreResult<Self> {
        options.validate()?;

        let engine = Arc::new(E::open(0, options.path_for(0))?);
        let workers = (0..options.partition_count)
            .map(|shard| {
                PartitionWorker::spawn_soft(shard, Arc::clone(&engine), options.queue_capacity)
            })
            .collect();

        let inner = Arc::new(SoftThreadedInner {
            partition_count: options.partition_count,
            hasher: Arc::clone(&options.hasher),
            engine,
            key_map: RwLock::new(BTreeKeyMap::new()),
            workers,
            tracker: Tracker::new(Arc::clone(&options.partitioner)),
            tracking: AtomicBool::new(false),
            repartitioning: AtomicBool::new(false),
        });

        let gate = LoopGate::new();
        let repartition_loop = options.auto_intervals().map(|(interval, tracking)| {
            let track_inner = Arc::clone(&inner);
            let repart_inner = Arc::clone(&inner);
            spawn_repartition_loop(
                Arc::clone(&gate),
                interval,
                tracking,
                move |on| track_inner.set_tracking(on),
                move || repart_inner.repartition_impl(),
            )
        });

        Ok(Self {
            inner,
            gate,
            repartition_loop,
        })
    }
}

impl<E: StorageEngine> SoftThreadedInner<E> {
    fn shard_for(&self, key: &str) -> usize {
        hash_shard(self.hasher.as_ref(), key, self.partition_count)
    }

    fn set_tracking(&self, enabled: bool) {
        self.tracking.store(enabled, Ordering::Relaxed);
    }

    fn tracking_enabled(&self) -> bool {
        self.tracking.load(Ordering::Relaxed)
    }

    fn read_impl(&self, key: &str) -> StoreResult<Vec<u8>> {
        let map = self.key_map.read();
        let shard = match map.get(key) {
            // Unrouted keys were never written.
            Some(shard) => shard,
            None => return Err(StoreError::NotFound),
        };
        let op = ReadOp::new(key, None);
        self.workers[shard].enqueue(Operation::Read(Arc::clone(&op)));
        drop(map);

        if self.tracking_enabled() {
            self.tracker.update(key);
        }

        let (status, value) = op.completion.wait();
        status.into_result().map(|()| value)
    }

    fn write_impl(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let hashed = self.shard_for(key);
        let mut map = self.key_map.write();
        let (shard, _existed) = map.get_or_insert(key, hashed);
        self.workers[shard].enqueue(Operation::Write(WriteOp {
            key: key.to_string(),
            value: value.to_vec(),
            engine: None,
        }));
        drop(map);

        if self.tracking_enabled() {
            self.tracker.update(key);
        }
        Ok(())
    }

    fn scan_impl(&self, prefix: &str, limit: usize) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let map = self.key_map.read();
        let mut keys = Vec::new();
        let mut participants = Vec::new();
        for (key, shard) in map.lower_bound(prefix).take(limit) {
            keys.push(key.clone());
            participants.push(*shard);
        }
        if keys.is_empty() {
            return Err(StoreError::NotFound);
        }
        participants.sort_unstable();
        participants.dedup();

        let op = ScanOp::single_engine(prefix, limit, participants.len());
        for &shard in &participants {
            self.workers[shard].enqueue(Operation::Scan(Arc::clone(&op)));
        }
        drop(map);

        if self.tracking_enabled() {
            self.tracker.multi_update(keys);
        }

        let status = op.completion.wait();
        status.into_result()?;
        Ok(op.take_results())
    }

    fn repartition_impl(&self) {
        self.repartitioning.store(true, Ordering::Relaxed);
        self.set_tracking(false);

        if self
            .tracker
            .prepare_for_partition_map_update(self.partition_count)
        {
            let mut map = self.key_map.write();
            self.tracker.update_partition_map(&mut *map);

            // Fence: operations enqueued after the swap run behind every
            // operation routed with the old map, on every worker.
            let sync = SyncOp::new(self.partition_count);
            for worker in &self.workers {
                worker.enqueue(Operation::Sync(Arc::clone(&sync)));
            }
            info!(
                component = "store",
                flavor = "soft-threaded",
                event = "routing_swapped",
                routed_keys = map.len(),
                "partition map rebuilt, workers fenced"
            );
        }

        self.repartitioning.store(false, Ordering::Relaxed);
    }
}

impl<E: StorageEngine> KvStore for SoftThreadedStore<E> {
    fn read(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.inner.read_impl(key)
    }

    fn write(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.inner.write_impl(key, value)
    }

    fn scan(&self, prefix: &str, limit: usize) -> StoreResult<Vec<(String, Vec<u8>)>> {
        self.inner.scan_impl(prefix, limit)
    }

    fn enable_tracking(&self, enabled: bool) {
        self.inner.set_tracking(enabled);
    }

    fn is_tracking(&self) -> bool {
        self.inner.tracking_enabled()
    }

    fn is_repartitioning(&self) -> bool {
        self.inner.repartitioning.load(Ordering::Relaxed)
    }

    fn repartition(&self) {
        self.inner.repartition_impl();
    }

    fn graph(&self) -> MutexGuard<'_, AccessGraph> {
        self.inner.tracker.graph()
    }

    fn operation_count(&self) -> u64 {
        self.inner.engine.operation_count()
    }
}

impl<E: StorageEngine> Drop for SoftThreadedStore<E> {
    fn drop(&mut self) {
        self.gate.shutdown();
        if let Some(handle) = self.repartition_loop.take() {
            let _ = handle.join();
        }
    }
}
