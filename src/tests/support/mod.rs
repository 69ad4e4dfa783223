//! Shared helpers for the cross-flavor test cases.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::engine::BTreeEngine;
use crate::store::{
    HardStore, HardThreadedStore, KvStore, SoftStore, SoftThreadedStore, StoreOptions,
};

/// Queue capacity small enough to keep tests light.
const TEST_QUEUE_CAPACITY: usize = 4096;

pub fn options(partitions: usize) -> StoreOptions {
    StoreOptions::new(partitions).with_queue_capacity(TEST_QUEUE_CAPACITY)
}

/// One instance of every store flavor over the ordered engine.
pub fn all_flavors(partitions: usize) -> Vec<(&'static str, Arc<dyn KvStore>)> {
    vec![
        (
            "soft",
            Arc::new(SoftStore::<BTreeEngine>::new(options(partitions)).unwrap())
                as Arc<dyn KvStore>,
        ),
        (
            "hard",
            Arc::new(HardStore::<BTreeEngine>::new(options(partitions)).unwrap()),
        ),
        (
            "soft-threaded",
            Arc::new(SoftThreadedStore::<BTreeEngine>::new(options(partitions)).unwrap()),
        ),
        (
            "hard-threaded",
            Arc::new(HardThreadedStore::<BTreeEngine>::new(options(partitions)).unwrap()),
        ),
    ]
}

/// Lets the tracker consumer fold everything queued so far.
pub fn settle() {
    thread::sleep(Duration::from_millis(100));
}

pub fn keys_of(rows: &[(String, Vec<u8>)]) -> Vec<&str> {
    rows.iter().map(|(k, _)| k.as_str()).collect()
}
