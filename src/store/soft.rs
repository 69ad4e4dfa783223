//! Lock-striped store over a single shared engine.

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
use crate::tracker::Tracker;

use super::repartition::{spawn_repartition_loop, LoopGate};
use super::{hash_shard, KvStore, StoreOptions};

/// Soft flavor: one engine, one shared mutex per shard.
///
/// The routing table steers each key to a shard whose stripe serializes
/// access; the engine itself is shared by every shard. Repartitioning only
/// rewrites the routing table, so data never moves.
pub struct SoftStore<E: StorageEngine> {
    inner: Arc<SoftInner<E>>,
    gate: Arc<LoopGate>,
    repartition_loop: Option<thread::JoinHandle<()>>,
}

struct SoftInner<E: StorageEngine> {
    partition_count: usize,
    hasher: Arc<dyn KeyHasher>,
    engine: E,
    shard_locks: Vec<RwLock<()>>,
    partition_map: RwLock<BTreeKeyMap<usize>>,
    tracker: Tracker,
    tracking: AtomicBool,
    repartitioning: AtomicBool,
}

impl<E: StorageEngine> SoftStore<E> {
    pub fn new(options: StoreOptions) -> StoreResult<Self> {
        options.validate()?;

        let engine = E::open(0, options.path_for(0))?;
        let inner = Arc::new(SoftInner {
            partition_count: options.partition_count,
            hasher: Arc::clone(&options.hasher),
            engine,
            shard_locks: (0..options.partition_count)
                .map(|_| RwLock::new(()))
                .collect(),
            partition_map: RwLock::new(BTreeKeyMap::new()),
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

impl<E: StorageEngine> SoftInner<E> {
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
        let map = self.partition_map.read();
        let shard = match map.get(key) {
            Some(shard) => shard,
            None => return Err(StoreError::NotFound),
        };
        let _stripe = self.shard_locks[shard].read();
        drop(map);

        let result = self.engine.read(key);
        drop(_stripe);

        if self.tracking_enabled() {
            self.tracker.update(key);
        }
        result
    }

    fn write_impl(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let hashed = self.shard_for(key);
        let mut map = self.partition_map.write();
        let (shard, _existed) = map.get_or_insert(key, hashed);
        let _stripe = self.shard_locks[shard].write();
        drop(map);

        let result = self.engine.write(key, value);
        drop(_stripe);

        if self.tracking_enabled() {
            self.tracker.update(key);
        }
        result
    }

    fn scan_impl(&self, prefix: &str, limit: usize) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let map = self.partition_map.read();
        let mut keys = Vec::new();
        let mut shards = Vec::new();
        for (key, shard) in map.lower_bound(prefix).take(limit) {
            keys.push(key.clone());
            shards.push(*shard);
        }
        if keys.is_empty() {
            return Err(StoreError::NotFound);
        }

        // Shared-lock every participating shard in id order, then let new
        // routing lookups proceed while values are read.
        let mut participants = shards;
        participants.sort_unstable();
        participants.dedup();
        let stripes: Vec<_> = participants
            .iter()
            .map(|&shard| self.shard_locks[shard].read())
            .collect();
        drop(map);

        let mut rows = Vec::with_capacity(keys.len());
        let mut failure = None;
        for key in &keys {
            match self.engine.read(key) {
                Ok(value) => rows.push((key.clone(), value)),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(stripes);

        if self.tracking_enabled() {
            self.tracker.multi_update(keys);
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(rows),
        }
    }

    fn repartition_impl(&self) {
        self.repartitioning.store(true, Ordering::Relaxed);
        self.set_tracking(false);

        if self
            .tracker
            .prepare_for_partition_map_update(self.partition_count)
        {
            let mut map = self.partition_map.write();
            let _stripes: Vec<_> = self
                .shard_locks
                .iter()
                .map(|stripe| stripe.write())
                .collect();
            self.tracker.update_partition_map(&mut *map);
            info!(
                component = "store",
                flavor = "soft",
                event = "routing_swapped",
                routed_keys = map.len(),
                "partition map rebuilt"
            );
        }

        self.repartitioning.store(false, Ordering::Relaxed);
    }
}

impl<E: StorageEngine> KvStore for SoftStore<E> {
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

impl<E: StorageEngine> Drop for SoftStore<E> {
    fn drop(&mut self) {
        self.gate.shutdown();
        if let Some(handle) = self.repartition_loop.take() {
            let _ = handle.join();
        }
    }
}
