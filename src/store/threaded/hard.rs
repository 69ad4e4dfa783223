//! Worker-threaded store with one engine per shard.

use parking_lot::{MutexGuard, RwLock};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};

use crate::engine::StorageEngine;
use crate::error::{StoreError, StoreResult};
use crate::graph::AccessGraph;
use crate::hash::KeyHasher;
use crate::routing::{BTreeKeyMap, KeyMap};
use crate::store::hard::HardState;
use crate::store::repartition::{spawn_repartition_loop, LoopGate};
use crate::store::{build_engines, hash_shard, KvStore, StoreOptions};
use crate::tracker::Tracker;

use super::operation::{Operation, ReadOp, ScanOp, WriteOp};
use super::worker::PartitionWorker;

/// Hard-threaded flavor: engine per shard, worker thread per shard.
///
/// Workers own no engine; every operation carries the handle(s) it needs.
/// Repartitioning reallocates engines at a bumped level without migrating
/// data — stale handles are detected on the next write of each key. An
/// in-flight operation keeps its old engine alive through the handle it
/// carries.
pub struct HardThreadedStore<E: StorageEngine> {
    inner: Arc<HardThreadedInner<E>>,
    gate: Arc<LoopGate>,
    repartition_loop: Option<thread::JoinHandle<()>>,
}

struct HardThreadedInner<E: StorageEngine> {
    partition_count: usize,
    hasher: Arc<dyn KeyHasher>,
    paths: Vec<PathBuf>,
    state: RwLock<HardState<E>>,
    workers: Vec<PartitionWorker<E>>,
    tracker: Tracker,
    tracking: AtomicBool,
    repartitioning: AtomicBool,
}

impl<E: StorageEngine> HardThreadedStore<E> {
    pub fn new(options: StoreOptions) -> StoreResult<Self> {
        options.validate()?;

        let engines = build_engines::<E>(options.partition_count, 0, &options.paths)?;
        let workers = (0..options.partition_count)
            .map(|shard| PartitionWorker::spawn_hard(shard, options.queue_capacity))
            .collect();

        let inner = Arc::new(HardThreadedInner {
            partition_count: options.partition_count,
            hasher: Arc::clone(&options.hasher),
            paths: options.paths.clone(),
            state: RwLock::new(HardState {
                storage_map: BTreeKeyMap::new(),
                partition_map: BTreeKeyMap::new(),
                engines,
                level: 0,
            }),
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

impl<E: StorageEngine> HardThreadedInner<E> {
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
        let state = self.state.read();
        // The storage map is authoritative: a not-yet-rehomed key still
        // reads from the engine it was last written to.
        let engine = match state.storage_map.get(key) {
            Some(engine) => engine,
            None => return Err(StoreError::NotFound),
        };
        let shard = match state.partition_map.get(key) {
            Some(shard) => shard,
            None => self.shard_for(key),
        };
        let op = ReadOp::new(key, Some(engine));
        self.workers[shard].enqueue(Operation::Read(Arc::clone(&op)));
        drop(state);

        if self.tracking_enabled() {
            self.tracker.update(key);
        }

        let (status, value) = op.completion.wait();
        status.into_result().map(|()| value)
    }

    fn write_impl(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let hashed = self.shard_for(key);
        let mut state = self.state.write();

        let default_engine = Arc::clone(&state.engines[hashed]);
        let (mut engine, existed) = state.storage_map.get_or_insert(key, default_engine);
        let shard = if existed {
            match state.partition_map.get(key) {
                Some(shard) => shard,
                None => {
                    state.partition_map.put(key, hashed);
                    hashed
                }
            }
        } else {
            state.partition_map.put(key, hashed);
            hashed
        };
        if engine.level() != state.level {
            // Stale handle: rehome onto the planned shard's fresh engine.
            engine = Arc::clone(&state.engines[shard]);
            state.storage_map.put(key, Arc::clone(&engine));
        }

        self.workers[shard].enqueue(Operation::Write(WriteOp {
            key: key.to_string(),
            value: value.to_vec(),
            engine: Some(engine),
        }));
        drop(state);

        if self.tracking_enabled() {
            self.tracker.update(key);
        }
        Ok(())
    }

    fn scan_impl(&self, prefix: &str, limit: usize) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let state = self.state.read();
        let mut keys = Vec::new();
        let mut slot_shards = Vec::new();
        let mut slot_engines = Vec::new();
        for (key, engine) in state.storage_map.lower_bound(prefix).take(limit) {
            let shard = match state.partition_map.get(key) {
                Some(shard) => shard,
                None => self.shard_for(key),
            };
            keys.push(key.clone());
            slot_shards.push(shard);
            slot_engines.push(Arc::clone(engine));
        }
        if keys.is_empty() {
            return Err(StoreError::NotFound);
        }

        let mut participants = slot_shards.clone();
        participants.sort_unstable();
        participants.dedup();

        let op = ScanOp::fanned_out(
            prefix,
            limit,
            keys.clone(),
            slot_shards,
            slot_engines,
            participants.len(),
        );
        for &shard in &participants {
            self.workers[shard].enqueue(Operation::Scan(Arc::clone(&op)));
        }
        drop(state);

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
            let mut state = self.state.write();
            let next_level = state.level + 1;
            match build_engines::<E>(self.partition_count, next_level, &self.paths) {
                Ok(next_engines) => {
                    self.tracker.update_partition_map(&mut state.partition_map);
                    state.level = next_level;
                    state.engines = next_engines;
                    info!(
                        component = "store",
                        flavor = "hard-threaded",
                        event = "routing_swapped",
                        level = next_level,
                        routed_keys = state.partition_map.len(),
                        "partition map rebuilt, engines reallocated"
                    );
                }
                Err(e) => {
                    error!(
                        component = "store",
                        flavor = "hard-threaded",
                        event = "engine_rebuild_failed",
                        error = %e,
                        "keeping previous engines and routing"
                    );
                }
            }
        }

        self.repartitioning.store(false, Ordering::Relaxed);
    }

    fn operation_count(&self) -> u64 {
        let state = self.state.read();
        state
            .engines
            .iter()
            .map(|engine| engine.operation_count())
            .sum()
    }
}

impl<E: StorageEngine> KvStore for HardThreadedStore<E> {
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
        self.inner.operation_count()
    }
}

impl<E: StorageEngine> Drop for HardThreadedStore<E> {
    fn drop(&mut self) {
        self.gate.shutdown();
        if let Some(handle) = self.repartition_loop.take() {
            let _ = handle.join();
        }
    }
}
