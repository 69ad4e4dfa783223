//! Ordered in-memory engine.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{StoreError, StoreResult};

use super::StorageEngine;

/// In-memory ordered engine over a `BTreeMap`.
///
/// Scans walk the tree from the lower bound directly, so range queries cost
/// O(log n + limit).
pub struct BTreeEngine {
    level: u64,
    data: RwLock<BTreeMap<String, Vec<u8>>>,
    stripe: RwLock<()>,
    ops: AtomicU64,
}

impl StorageEngine for BTreeEngine {
    fn open(level: u64, _path: &Path) -> StoreResult<Self> {
        Ok(Self {
            level,
            data: RwLock::new(BTreeMap::new()),
            stripe: RwLock::new(()),
            ops: AtomicU64::new(0),
        })
    }

    fn read(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.ops.fetch_add(1, Ordering::Relaxed);
        self.data
            .read()
            .get(key)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn write(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        self.ops.fetch_add(1, Ordering::Relaxed);
        self.data.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn scan(&self, lower_bound: &str, limit: usize) -> StoreResult<Vec<(String, Vec<u8>)>> {
        self.ops.fetch_add(1, Ordering::Relaxed);
        let data = self.data.read();
        let rows: Vec<(String, Vec<u8>)> = data
            .range(lower_bound.to_string()..)
            .take(limit)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(rows)
    }

    fn level(&self) -> u64 {
        self.level
    }

    fn operation_count(&self) -> u64 {
        self.ops.load(Ordering::Relaxed)
    }

    fn lock_shared(&self) -> RwLockReadGuard<'_, ()> {
        self.stripe.read()
    }

    fn lock_exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.stripe.write()
    }
}
