//! Tracker: folds key-access batches into the co-access graph and derives
//! new routing assignments from it.

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::graph::{AccessGraph, CsrGraph, Partitioner};
use crate::queue::BoundedQueue;
use crate::routing::KeyMap;

/// Maximum number of pending key batches. Producers block when reached.
const QUEUE_CAPACITY: usize = 1_000_000;

/// Grace interval letting the consumer finish an in-flight fold before the
/// graph is partitioned.
const DRAIN_SETTLE: Duration = Duration::from_millis(10);

struct Shared {
    queue: BoundedQueue<Vec<String>>,
    graph: Mutex<AccessGraph>,
    running: AtomicBool,
}

/// Routing assignments computed from the graph, waiting to be written into
/// a partition map.
struct PartitionPlan {
    keys: Vec<String>,
    assignment: Vec<usize>,
}

/// Consumes key-access batches on a background thread.
///
/// Producers push batches through `update` / `multi_update`; the single
/// consumer folds each batch into the graph under the graph mutex. Batches
/// fold in enqueue order; there is no atomicity across batches.
pub struct Tracker {
    shared: Arc<Shared>,
    partitioner: Arc<dyn Partitioner>,
    plan: Mutex<Option<PartitionPlan>>,
    consumer: Option<thread::JoinHandle<()>>,
}

impl Tracker {
    /// Starts the consumer thread.
    pub fn new(partitioner: Arc<dyn Partitioner>) -> Self {
        let shared = Arc::new(Shared {
            queue: BoundedQueue::new(QUEUE_CAPACITY),
            graph: Mutex::new(AccessGraph::new()),
            running: AtomicBool::new(true),
        });

        let consumer = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("tracker".to_string())
                .spawn(move || consume_loop(&shared))
                .expect("failed to spawn tracker thread")
        };

        Self {
            shared,
            partitioner,
            plan: Mutex::new(None),
            consumer: Some(consumer),
        }
    }

    /// Records one key access.
    pub fn update(&self, key: &str) {
        self.shared.queue.push(vec![key.to_string()]);
    }

    /// Records a set of co-accessed keys (one scan's result set).
    pub fn multi_update(&self, keys: Vec<String>) {
        if keys.is_empty() {
            return;
        }
        self.shared.queue.push(keys);
    }

    /// Discards pending batches and clears the graph.
    pub fn clear_graph(&self) {
        self.shared.queue.drain();
        self.shared.graph.lock().clear();
    }

    /// Read access to the graph for diagnostics and tests.
    pub fn graph(&self) -> MutexGuard<'_, AccessGraph> {
        self.shared.graph.lock()
    }

    /// Partitions the accumulated graph into `parts` parts.
    ///
    /// Pending batches are discarded first, then the consumer gets a short
    /// settle interval for any in-flight fold. Returns `true` when a new
    /// assignment is staged; on `false` the caller keeps its routing table
    /// and the graph is left intact for the next round.
    pub fn prepare_for_partition_map_update(&self, parts: usize) -> bool {
        self.shared.queue.drain();
        thread::sleep(DRAIN_SETTLE);

        let graph = self.shared.graph.lock();
        if graph.vertex_count() <= 1 {
            debug!(
                component = "tracker",
                event = "partition_skipped",
                vertices = graph.vertex_count(),
                "not enough tracked keys to partition"
            );
            return false;
        }

        let csr = match CsrGraph::from_graph(&graph) {
            Ok(csr) => csr,
            Err(e) => {
                warn!(
                    component = "tracker",
                    event = "csr_failed",
                    error = %e,
                    "keeping previous routing"
                );
                return false;
            }
        };
        drop(graph);

        match self.partitioner.partition(&csr, parts) {
            Ok(assignment) => {
                let keys = csr.into_keys();
                debug!(
                    component = "tracker",
                    event = "partition_ready",
                    keys = keys.len(),
                    parts,
                    "new assignment staged"
                );
                *self.plan.lock() = Some(PartitionPlan { keys, assignment });
                true
            }
            Err(e) => {
                warn!(
                    component = "tracker",
                    event = "partition_failed",
                    error = %e,
                    "keeping previous routing"
                );
                false
            }
        }
    }

    /// Writes the staged assignment into `map` and clears the graph.
    ///
    /// Must follow a successful `prepare_for_partition_map_update`, with the
    /// caller holding its routing-table write lock.
    pub fn update_partition_map<M: KeyMap<usize>>(&self, map: &mut M) {
        if let Some(plan) = self.plan.lock().take() {
            for (key, part) in plan.keys.iter().zip(plan.assignment.iter()) {
                map.put(key, *part);
            }
        }
        self.shared.graph.lock().clear();
    }

    /// Stops the consumer thread and joins it.
    pub fn release(&mut self) {
        if self.shared.running.swap(false, Ordering::Relaxed) {
            // Empty sentinel batch wakes the blocking pop.
            self.shared.queue.push(Vec::new());
        }
        if let Some(handle) = self.consumer.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.release();
    }
}

fn consume_loop(shared: &Shared) {
    loop {
        let batch = shared.queue.pop();
        if !shared.running.load(Ordering::Relaxed) {
            return;
        }
        if batch.is_empty() {
            continue;
        }

        let mut graph = shared.graph.lock();
        if batch.len() == 1 {
            graph.increment_vertex(&batch[0]);
        } else {
            for key in &batch {
                graph.increment_vertex(key);
            }
            for i in 0..batch.len() {
                for j in (i + 1)..batch.len() {
                    graph.increment_edge(&batch[i], &batch[j]);
                }
            }
        }
    }
}
