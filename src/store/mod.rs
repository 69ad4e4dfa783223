//! Partitioned key-value store facades.

pub mod hard;
pub mod options;
pub mod soft;
pub mod threaded;

mod repartition;

#[cfg(test)]
mod soft_test;

pub use hard::HardStore;
pub use options::StoreOptions;
pub use soft::SoftStore;
pub use threaded::{HardThreadedStore, SoftThreadedStore};

use parking_lot::MutexGuard;
use std::path::PathBuf;
use std::sync::Arc;

use crate::engine::StorageEngine;
use crate::error::StoreResult;
use crate::graph::AccessGraph;
use crate::hash::KeyHasher;

/// Public surface shared by all store flavors.
///
/// `read` and `scan` surface the precise outcome; `write` is
/// fire-and-forget in the threaded flavors and reports only enqueue-side
/// failures. `repartition` blocks until the routing swap has completed.
pub trait KvStore: Send + Sync {
    /// Reads the value for `key`.
    fn read(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Writes a key-value pair.
    fn write(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Returns up to `limit` pairs with the smallest keys >= `prefix`, in
    /// ascending key order.
    fn scan(&self, prefix: &str, limit: usize) -> StoreResult<Vec<(String, Vec<u8>)>>;

    /// Turns access tracking on or off.
    fn enable_tracking(&self, enabled: bool);

    /// Whether accesses currently feed the co-access graph.
    fn is_tracking(&self) -> bool;

    /// Whether a repartitioning pass is in progress.
    fn is_repartitioning(&self) -> bool;

    /// Re-derives the routing table from the co-access graph. Blocking.
    fn repartition(&self);

    /// The tracker's co-access graph, for diagnostics.
    fn graph(&self) -> MutexGuard<'_, AccessGraph>;

    /// Total operations executed by the underlying engines.
    fn operation_count(&self) -> u64;
}

/// Maps a key to its hash-assigned shard.
pub(crate) fn hash_shard(hasher: &dyn KeyHasher, key: &str, partition_count: usize) -> usize {
    (hasher.hash(key) % partition_count as u64) as usize
}

/// Opens one engine per shard at `level`, distributing shards round-robin
/// across the configured paths.
pub(crate) fn build_engines<E: StorageEngine>(
    partition_count: usize,
    level: u64,
    paths: &[PathBuf],
) -> StoreResult<Vec<Arc<E>>> {
    let mut engines = Vec::with_capacity(partition_count);
    for shard in 0..partition_count {
        engines.push(Arc::new(E::open(level, &paths[shard % paths.len()])?));
    }
    Ok(engines)
}
