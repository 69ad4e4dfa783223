//! Lock-striped store with one engine per shard.

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
use crate::tracker::Tracker;

use super::repartition::{spawn_repartition_loop, LoopGate};
use super::{build_engines, hash_shard, KvStore, StoreOptions};

/// Routing state guarded by the routing-table lock.
///
/// The storage map is authoritative for reads and scans; the partition map
/// records the planned shard and is consulted when a stale engine handle is
/// detected. Invariant: every routed key either points at an engine of the
/// current level or gets reassigned on its next write.
pub(crate) struct HardState<E> {
    pub storage_map: BTreeKeyMap<Arc<E>>,
    pub partition_map: BTreeKeyMap<usize>,
    pub engines: Vec<Arc<E>>,
    pub level: u64,
}

/// Hard flavor: engine per shard, striping through the engines' own locks.
///
/// Repartitioning bumps the level and replaces the engine set without
/// migrating data; keys rehome lazily when next written, detected through
/// the level mismatch on their stored handle.
pub struct HardStore<E: StorageEngine> {
    inner: Arc<HardInner<E>>,
    gate: Arc<LoopGate>,
    repartition_loop: Option<thread::JoinHandle<()>>,
}

struct HardInner<E: StorageEngine> {
    partition_count: usize,
    hasher: Arc<dyn KeyHasher>,
    paths: Vec<PathBuf>,
    state: RwLock<HardState<E>>,
    tracker: Tracker,
    tracking: AtomicBool,
    repartitioning: AtomicBool,
}

impl<E: StorageEngine> HardStore<E> {
    pub fn new(options: StoreOptions) -> StoreResult<Self> {
        options.validate()?;

        let engines = build_engines::<E>(options.partition_count, 0, &options.paths)?;
        let inner = Arc::new(HardInner {
            partition_count: options.partition_count,
            hasher: Arc::clone(&options.hasher),
            paths: options.paths.clone(),
            state: RwLock::new(HardState {
                storage_map: BTreeKeyMap::new(),
                partition_map: BTreeKeyMap::new(),
                engines,
                level: 0,
            }),
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

impl<E: StorageEngine> HardInner<E> {
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
        // A key not yet rehomed still reads from its old engine.
        let engine = match state.storage_map.get(key) {
            Some(engine) => engine,
            None => return Err(StoreError::NotFound),
        };
        let _stripe = engine.lock_shared();
        drop(state);

        let result = engine.read(key);
        drop(_stripe);

        if self.tracking_enabled() {
            self.tracker.update(key);
        }
        result
    }

    fn write_impl(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let hashed = self.shard_for(key);
        let mut state = self.state.write();

        let default_engine = Arc::clone(&state.engines[hashed]);
        let (mut engine, existed) = state.storage_map.get_or_insert(key, default_engine);
        if !existed {
            state.partition_map.put(key, hashed);
        } else if engine.level() != state.level {
            // Stale handle from before the last repartition: rehome onto the
            // planned shard, falling back to hash assignment.
            let shard = match state.partition_map.get(key) {
                Some(shard) => shard,
                None => {
                    state.partition_map.put(key, hashed);
                    hashed
                }
            };
            engine = Arc::clone(&state.engines[shard]);
            state.storage_map.put(key, Arc::clone(&engine));
        }

        let _stripe = engine.lock_exclusive();
        drop(state);

        let result = engine.write(key, value);
        drop(_stripe);

        if self.tracking_enabled() {
            self.tracker.update(key);
        }
        result
    }

    fn scan_impl(&self, prefix: &str, limit: usize) -> StoreResult<Vec<(String, Vec<u8>)>> {
        let state = self.state.read();
        let mut keys = Vec::new();
        let mut engines = Vec::new();
        for (key, engine) in state.storage_map.lower_bound(prefix).take(limit) {
            keys.push(key.clone());
            engines.push(Arc::clone(engine));
        }
        if keys.is_empty() {
            return Err(StoreError::NotFound);
        }

        // Pointer order is a stable tie-break, so concurrent scans cannot
        // deadlock on overlapping engine sets.
        let mut locked = engines.clone();
        locked.sort_by_key(|engine| Arc::as_ptr(engine) as usize);
        locked.dedup_by(|a, b| Arc::ptr_eq(a, b));
        let stripes: Vec<_> = locked.iter().map(|engine| engine.lock_shared()).collect();
        drop(state);

        let mut rows = Vec::with_capacity(keys.len());
        let mut failure = None;
        for (key, engine) in keys.iter().zip(engines.iter()) {
            match engine.read(key) {
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
            let mut state = self.state.write();
            let next_level = state.level + 1;
            match build_engines::<E>(self.partition_count, next_level, &self.paths) {
                Ok(next_engines) => {
                    let mut locked = state.engines.clone();
                    locked.sort_by_key(|engine| Arc::as_ptr(engine) as usize);
                    let _stripes: Vec<_> =
                        locked.iter().map(|engine| engine.lock_shared()).collect();

                    self.tracker.update_partition_map(&mut state.partition_map);
                    state.level = next_level;
                    state.engines = next_engines;
                    info!(
                        component = "store",
                        flavor = "hard",
                        event = "routing_swapped",
                        level = next_level,
                        routed_keys = state.partition_map.len(),
                        "partition map rebuilt, engines reallocated"
                    );
                }
                Err(e) => {
                    error!(
                        component = "store",
                        flavor = "hard",
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

impl<E: StorageEngine> KvStore for HardStore<E> {
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

impl<E: StorageEngine> Drop for HardStore<E> {
    fn drop(&mut self) {
        self.gate.shutdown();
        if let Some(handle) = self.repartition_loop.take() {
            let _ = handle.join();
        }
    }
}
