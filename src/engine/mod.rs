//! Storage engines backing the partitioned store.

pub mod btree;
pub mod hash;


pub use btree::BTreeEngine;
pub use hash::HashEngine;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use std::path::Path;

use crate::error::StoreResult;

/// Contract for a single-shard storage engine.
///
/// Engines keep their own data consistent but perform no cross-key
/// coordination; the store serializes access either through shard locks or
/// through a single worker thread per shard. The `level` identifies the
/// repartitioning generation an engine was created in, letting the store
/// detect stale engine handles after routing has been rebuilt.
///
/// `lock_shared` / `lock_exclusive` expose the striping lock used by the
/// lock-striped store flavors; threaded flavors never take it.
pub trait StorageEngine: Send + Sync + 'static {
    /// Opens an engine for the given generation at `path`.
    ///
    /// In-memory engines accept the path for interface parity with
    /// file-backed ones and ignore it.
    fn open(level: u64, path: &Path) -> StoreResult<Self>
    where
        Self: Sized;

    /// Reads the value for `key`; `NotFound` when the key is absent.
    fn read(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Writes a key-value pair, replacing any previous value.
    fn write(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Returns up to `limit` pairs with the smallest keys not less than
    /// `lower_bound`, in ascending key order; `NotFound` when no key
    /// qualifies.
    fn scan(&self, lower_bound: &str, limit: usize) -> StoreResult<Vec<(String, Vec<u8>)>>;

    /// Repartitioning generation this engine was created in.
    fn level(&self) -> u64;

    /// Total operations executed by this engine.
    fn operation_count(&self) -> u64;

    /// Acquires the engine's striping lock shared.
    fn lock_shared(&self) -> RwLockReadGuard<'_, ()>;

    /// Acquires the engine's striping lock exclusive.
    fn lock_exclusive(&self) -> RwLockWriteGuard<'_, ()>;
}
