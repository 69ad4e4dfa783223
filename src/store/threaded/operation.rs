//! Operation messages passed to partition workers.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};

use super::barrier::Barrier;
use super::future::OneShot;

/// Outcome of an operation while it travels through workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpStatus {
    /// Not finalized yet; only observable on fan-out scans in flight.
    Pending,
    Success,
    NotFound,
    Error(String),
}

impl From<StoreError> for OpStatus {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => OpStatus::NotFound,
            StoreError::Engine(msg) | StoreError::Config(msg) => OpStatus::Error(msg),
        }
    }
}

impl OpStatus {
    /// Converts a finalized status back into the facade result.
    pub fn into_result(self) -> StoreResult<()> {
        match self {
            OpStatus::Success => Ok(()),
            OpStatus::NotFound => Err(StoreError::NotFound),
            OpStatus::Error(msg) => Err(StoreError::Engine(msg)),
            OpStatus::Pending => Err(StoreError::Engine(
                "operation left pending".to_string(),
            )),
        }
    }
}

/// Point read. Completion carries the status and the value.
pub struct ReadOp<E> {
    pub key: String,
    /// Engine handle for stores whose workers own no engine.
    pub engine: Option<Arc<E>>,
    pub completion: OneShot<(OpStatus, Vec<u8>)>,
}

impl<E> ReadOp<E> {
    pub fn new(key: &str, engine: Option<Arc<E>>) -> Arc<Self> {
        Arc::new(Self {
            key: key.to_string(),
            engine,
            completion: OneShot::new(),
        })
    }
}

/// Blind write. Owned by the queue; the worker drops it after the engine
/// call, and no completion flows back.
pub struct WriteOp<E> {
    pub key: String,
    pub value: Vec<u8>,
    pub engine: Option<Arc<E>>,
}

/// Fan-out scan shared by every participating worker.
///
/// Result slots are prefilled with the collected keys; each worker fills
/// the values of the slots assigned to its shard, then meets the others at
/// the barrier. The coordinator resolves `Pending` to `Success` (or keeps
/// the last recorded failure) and signals the completion.
pub struct ScanOp<E> {
    pub prefix: String,
    pub limit: usize,
    pub keys: Vec<String>,
    /// Owning shard per result slot (fan-out form only).
    pub slot_shards: Vec<usize>,
    /// Engine handle per result slot (fan-out form only).
    pub slot_engines: Vec<Arc<E>>,
    results: Mutex<Vec<(String, Vec<u8>)>>,
    status: Mutex<OpStatus>,
    pub barrier: Barrier,
    pub completion: OneShot<OpStatus>,
}

impl<E> ScanOp<E> {
    /// Scan over a single shared engine: the coordinator runs the whole
    /// engine scan, the barrier only fences the participants.
    pub fn single_engine(prefix: &str, limit: usize, participants: usize) -> Arc<Self> {
        Arc::new(Self {
            prefix: prefix.to_string(),
            limit,
            keys: Vec::new(),
            slot_shards: Vec::new(),
            slot_engines: Vec::new(),
            results: Mutex::new(Vec::new()),
            status: Mutex::new(OpStatus::Pending),
            barrier: Barrier::new(participants),
            completion: OneShot::new(),
        })
    }

    /// Scan fanned out across per-shard engines with prefilled slots.
    pub fn fanned_out(
        prefix: &str,
        limit: usize,
        keys: Vec<String>,
        slot_shards: Vec<usize>,
        slot_engines: Vec<Arc<E>>,
        participants: usize,
    ) -> Arc<Self> {
        let results = keys.iter().map(|key| (key.clone(), Vec::new())).collect();
        Arc::new(Self {
            prefix: prefix.to_string(),
            limit,
            keys,
            slot_shards,
            slot_engines,
            results: Mutex::new(results),
            status: Mutex::new(OpStatus::Pending),
            barrier: Barrier::new(participants),
            completion: OneShot::new(),
        })
    }

    /// Stores values into the given result slots.
    pub fn store_values(&self, filled: Vec<(usize, Vec<u8>)>) {
        let mut rows = self.results.lock();
        for (slot, value) in filled {
            rows[slot].1 = value;
        }
    }

    /// Replaces the whole result set (single-engine form).
    pub fn replace_results(&self, rows: Vec<(String, Vec<u8>)>) {
        *self.results.lock() = rows;
    }

    /// Records a failure; the last one recorded wins.
    pub fn record_failure(&self, status: OpStatus) {
        *self.status.lock() = status;
    }

    /// Resolves the final status; `Pending` becomes `Success`.
    pub fn finalize(&self) -> OpStatus {
        let mut status = self.status.lock();
        if *status == OpStatus::Pending {
            *status = OpStatus::Success;
        }
        status.clone()
    }

    /// Moves the results out once the completion has fired.
    pub fn take_results(&self) -> Vec<(String, Vec<u8>)> {
        std::mem::take(&mut *self.results.lock())
    }
}

/// Routing-swap fence: every worker arrives at the barrier, guaranteeing
/// all previously enqueued operations have been served.
pub struct SyncOp {
    pub barrier: Barrier,
}

impl SyncOp {
    pub fn new(participants: usize) -> Arc<Self> {
        Arc::new(Self {
            barrier: Barrier::new(participants),
        })
    }
}

/// Drain-and-stop handshake between a worker and its owner.
pub struct DoneOp {
    pub barrier: Barrier,
}

impl DoneOp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            barrier: Barrier::new(2),
        })
    }
}

/// Message consumed by a partition worker.
///
/// Completion-bearing variants are shared through `Arc` so the submitter
/// can join them; writes move into the queue and die with the worker's
/// dispatch.
pub enum Operation<E> {
    Read(Arc<ReadOp<E>>),
    Write(WriteOp<E>),
    Scan(Arc<ScanOp<E>>),
    Sync(Arc<SyncOp>),
    Done(Arc<DoneOp>),
}
