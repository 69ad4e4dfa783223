//! Single-use barrier with a coordinator flag.

use parking_lot::{Condvar, Mutex};

/// N-way rendezvous that elects one arriver as coordinator.
///
/// `arrive` blocks until all participants have arrived, then returns `true`
/// on exactly one of them (the last arriver). The coordinator finalizes
/// whatever shared work the barrier was guarding. Single use: the barrier
/// does not reset.
pub struct Barrier {
    participants: usize,
    arrived: Mutex<usize>,
    cv: Condvar,
}

impl Barrier {
    pub fn new(participants: usize) -> Self {
        Self {
            participants: participants.max(1),
            arrived: Mutex::new(0),
            cv: Condvar::new(),
        }
    }

    /// Blocks until every participant arrived; `true` for the coordinator.
    pub fn arrive(&self) -> bool {
        let mut arrived = self.arrived.lock();
        *arrived += 1;
        if *arrived >= self.participants {
            self.cv.notify_all();
            return true;
        }
        while *arrived < self.participants {
            self.cv.wait(&mut arrived);
        }
        false
    }
}
