//! Unordered in-memory engine.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{StoreError, StoreResult};

use super::StorageEngine;

/// In-memory unordered engine over a `HashMap`.
///
/// Point operations are O(1); scans collect every qualifying key and sort,
/// so they cost O(n log n). Useful as the point-lookup-heavy counterpart to
/// [`super::BTreeEngine`].
pub struct HashEngine {
    level: u64,
    data: RwLock<HashMap<String, Vec<u8>>>,
    stripe: RwLock<()>,
    ops: AtomicU64,
}

impl StorageEngine for HashEngine {
    fn open(level: u64, _path: &Path) -> StoreResult<Self> {
        Ok(Self {
            level,
            data: RwLock::new(HashMap::new()),
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
        let mut rows: Vec<(String, Vec<u8>)> = data
            .iter()
            .filter(|(k, _)| k.as_str() >= lower_bound)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows.truncate(limit);
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
