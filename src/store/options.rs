//! Store construction parameters.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{StoreError, StoreResult};
use crate::graph::{GreedyPartitioner, Partitioner};
use crate::hash::{KeyHasher, Xxh3KeyHasher};

/// Default capacity of each worker's ingress queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1 << 20;

/// Parameters accepted by every store flavor.
///
/// Automatic repartitioning runs only when more than one partition exists
/// and both durations are set and positive.
#[derive(Clone)]
pub struct StoreOptions {
    pub partition_count: usize,
    pub hasher: Arc<dyn KeyHasher>,
    pub partitioner: Arc<dyn Partitioner>,
    pub tracking_duration: Option<Duration>,
    pub repartition_interval: Option<Duration>,
    /// Directories handed to engines; Hard flavors distribute shards
    /// round-robin across them.
    pub paths: Vec<PathBuf>,
    /// Ingress queue capacity per worker (threaded flavors only).
    pub queue_capacity: usize,
}

impl StoreOptions {
    pub fn new(partition_count: usize) -> Self {
        Self {
            partition_count,
            hasher: Arc::new(Xxh3KeyHasher),
            partitioner: Arc::new(GreedyPartitioner),
            tracking_duration: None,
            repartition_interval: None,
            paths: vec![std::env::temp_dir()],
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn KeyHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn with_partitioner(mut self, partitioner: Arc<dyn Partitioner>) -> Self {
        self.partitioner = partitioner;
        self
    }

    pub fn with_tracking_duration(mut self, duration: Duration) -> Self {
        self.tracking_duration = Some(duration);
        self
    }

    pub fn with_repartition_interval(mut self, interval: Duration) -> Self {
        self.repartition_interval = Some(interval);
        self
    }

    pub fn with_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub(crate) fn validate(&self) -> StoreResult<()> {
        if self.partition_count == 0 {
            return Err(StoreError::Config(
                "partition count must be at least 1".to_string(),
            ));
        }
        if self.paths.is_empty() {
            return Err(StoreError::Config(
                "at least one storage path is required".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(StoreError::Config(
                "worker queue capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// `(repartition_interval, tracking_duration)` when automatic
    /// repartitioning applies.
    pub(crate) fn auto_intervals(&self) -> Option<(Duration, Duration)> {
        if self.partition_count <= 1 {
            return None;
        }
        match (self.repartition_interval, self.tracking_duration) {
            (Some(interval), Some(tracking)) if !interval.is_zero() && !tracking.is_zero() => {
                Some((interval, tracking))
            }
            _ => None,
        }
    }

    pub(crate) fn path_for(&self, shard: usize) -> &Path {
        &self.paths[shard % self.paths.len()]
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::new(1)
    }
}
