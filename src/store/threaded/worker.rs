//! Per-shard operation workers.

use std::sync::Arc;
use std::thread;
use tracing::warn;

use crate::engine::StorageEngine;
use crate::queue::BoundedQueue;

use super::operation::{DoneOp, OpStatus, Operation, ReadOp, ScanOp, WriteOp};

/// Single-consumer worker serving one shard's operation queue.
///
/// Operations are served strictly FIFO. The soft form holds the store's
/// shared engine; the hard form owns nothing and uses the engine handles
/// carried by each operation. Dropping the worker enqueues a Done handshake
/// and joins the thread, so every previously enqueued operation is served
/// first.
pub struct PartitionWorker<E: StorageEngine> {
    queue: Arc<BoundedQueue<Operation<E>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl<E: StorageEngine> PartitionWorker<E> {
    /// Worker for a shard of the single-engine store.
    pub fn spawn_soft(shard: usize, engine: Arc<E>, queue_capacity: usize) -> Self {
        let queue = Arc::new(BoundedQueue::new(queue_capacity));
        let handle = {
            let queue = Arc::clone(&queue);
            thread::Builder::new()
                .name(format!("shard-worker-{shard}"))
                .spawn(move || soft_loop(engine.as_ref(), &queue))
                .expect("failed to spawn shard worker")
        };
        Self {
            queue,
            handle: Some(handle),
        }
    }

    /// Worker for a shard of the engine-per-shard store.
    pub fn spawn_hard(shard: usize, queue_capacity: usize) -> Self {
        let queue = Arc::new(BoundedQueue::new(queue_capacity));
        let handle = {
            let queue = Arc::clone(&queue);
            thread::Builder::new()
                .name(format!("shard-worker-{shard}"))
                .spawn(move || hard_loop(shard, &queue))
                .expect("failed to spawn shard worker")
        };
        Self {
            queue,
            handle: Some(handle),
        }
    }

    /// Queues an operation, blocking while the queue is full.
    pub fn enqueue(&self, op: Operation<E>) {
        self.queue.push(op);
    }
}

impl<E: StorageEngine> Drop for PartitionWorker<E> {
    fn drop(&mut self) {
        let done = DoneOp::new();
        self.queue.push(Operation::Done(Arc::clone(&done)));
        done.barrier.arrive();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve_read<E: StorageEngine>(engine: &E, op: &ReadOp<E>) {
    match engine.read(&op.key) {
        Ok(value) => op.completion.notify((OpStatus::Success, value)),
        Err(e) => op.completion.notify((e.into(), Vec::new())),
    }
}

fn serve_write<E: StorageEngine>(engine: &E, op: &WriteOp<E>) {
    // Fire-and-forget: the engine's own counters are the only failure
    // surface for writes.
    if let Err(e) = engine.write(&op.key, &op.value) {
        warn!(
            component = "worker",
            event = "write_failed",
            key = %op.key,
            error = %e,
            "write dropped"
        );
    }
}

fn soft_loop<E: StorageEngine>(engine: &E, queue: &BoundedQueue<Operation<E>>) {
    loop {
        match queue.pop() {
            Operation::Read(op) => serve_read(engine, &op),
            Operation::Write(op) => serve_write(engine, &op),
            Operation::Scan(op) => {
                // The barrier fences every participant first, so writes
                // enqueued before the scan are visible to the coordinator.
                if op.barrier.arrive() {
                    match engine.scan(&op.prefix, op.limit) {
                        Ok(rows) => op.replace_results(rows),
                        Err(e) => op.record_failure(e.into()),
                    }
                    let status = op.finalize();
                    op.completion.notify(status);
                }
            }
            Operation::Sync(op) => {
                op.barrier.arrive();
            }
            Operation::Done(op) => {
                op.barrier.arrive();
                return;
            }
        }
    }
}

fn serve_hard_scan<E: StorageEngine>(shard: usize, op: &ScanOp<E>) {
    let mut filled = Vec::new();
    let mut failure = None;
    for slot in 0..op.keys.len() {
        if op.slot_shards[slot] != shard {
            continue;
        }
        match op.slot_engines[slot].read(&op.keys[slot]) {
            Ok(value) => filled.push((slot, value)),
            Err(e) => failure = Some(OpStatus::from(e)),
        }
    }
    op.store_values(filled);
    if let Some(status) = failure {
        op.record_failure(status);
    }

    if op.barrier.arrive() {
        let status = op.finalize();
        op.completion.notify(status);
    }
}

fn hard_loop<E: StorageEngine>(shard: usize, queue: &BoundedQueue<Operation<E>>) {
    loop {
        match queue.pop() {
            Operation::Read(op) => match op.engine.as_deref() {
                Some(engine) => serve_read(engine, &op),
                None => op.completion.notify((
                    OpStatus::Error("read dispatched without engine handle".to_string()),
                    Vec::new(),
                )),
            },
            Operation::Write(op) => match op.engine.as_deref() {
                Some(engine) => serve_write(engine, &op),
                None => warn!(
                    component = "worker",
                    event = "write_dropped",
                    key = %op.key,
                    "write dispatched without engine handle"
                ),
            },
            Operation::Scan(op) => serve_hard_scan(shard, &op),
            Operation::Sync(op) => {
                op.barrier.arrive();
            }
            Operation::Done(op) => {
                op.barrier.arrive();
                return;
            }
        }
    }
}
