//! One-shot completion primitive.

use parking_lot::{Condvar, Mutex};

/// Single-slot rendezvous between a submitting thread and a worker.
///
/// `notify` delivers the completion value exactly once; `wait` blocks until
/// it arrives and takes it. One waiter per instance.
pub struct OneShot<T> {
    slot: Mutex<Option<T>>,
    cv: Condvar,
}

impl<T> OneShot<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            cv: Condvar::new(),
        }
    }

    /// Delivers the completion value. Must be called at most once.
    pub fn notify(&self, value: T) {
        let mut slot = self.slot.lock();
        debug_assert!(slot.is_none(), "completion delivered twice");
        *slot = Some(value);
        self.cv.notify_one();
    }

    /// Blocks until the value is delivered and takes it.
    pub fn wait(&self) -> T {
        let mut slot = self.slot.lock();
        loop {
            if let Some(value) = slot.take() {
                return value;
            }
            self.cv.wait(&mut slot);
        }
    }
}

impl<T> Default for OneShot<T> {
    fn default() -> Self {
        Self::new()
    }
}
