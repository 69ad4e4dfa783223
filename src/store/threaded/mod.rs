//! Worker-thread store flavors and their operation protocol.

pub mod barrier;
pub mod future;
pub mod hard;
pub mod operation;
pub mod soft;
pub mod worker;

#[cfg(test)]
mod hard_test;
#[cfg(test)]
mod sync_test;
#[cfg(test)]
mod worker_test;

pub use barrier::Barrier;
pub use future::OneShot;
pub use hard::HardThreadedStore;
pub use operation::{DoneOp, OpStatus, Operation, ReadOp, ScanOp, SyncOp, WriteOp};
pub use soft::SoftThreadedStore;
pub use worker::PartitionWorker;
