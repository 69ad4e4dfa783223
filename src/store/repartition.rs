//! Background repartitioning loop shared by the store flavors.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Wakeable gate for the repartition loop's sleeps.
///
/// `shutdown` wakes any sleeper immediately so store destruction never
/// waits out a full interval.
pub(crate) struct LoopGate {
    running: AtomicBool,
    mu: Mutex<()>,
    cv: Condvar,
}

impl LoopGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            running: AtomicBool::new(true),
            mu: Mutex::new(()),
            cv: Condvar::new(),
        })
    }

    /// Sleeps up to `duration`; returns `false` once shut down.
    pub fn sleep(&self, duration: Duration) -> bool {
        let mut guard = self.mu.lock();
        if !self.running.load(Ordering::Relaxed) {
            return false;
        }
        let _ = self.cv.wait_for(&mut guard, duration);
        self.running.load(Ordering::Relaxed)
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
        // Taking the mutex orders the store against a sleeper that checked
        // the flag but has not started waiting yet.
        drop(self.mu.lock());
        self.cv.notify_all();
    }
}

/// Spawns the cycle `sleep(interval) -> track -> sleep(tracking) ->
/// repartition` until the gate shuts down. `repartition` is expected to
/// turn tracking back off.
pub(crate) fn spawn_repartition_loop<T, R>(
    gate: Arc<LoopGate>,
    interval: Duration,
    tracking: Duration,
    set_tracking: T,
    repartition: R,
) -> thread::JoinHandle<()>
where
    T: Fn(bool) + Send + 'static,
    R: Fn() + Send + 'static,
{
    thread::Builder::new()
        .name("repartition-loop".to_string())
        .spawn(move || loop {
            if !gate.sleep(interval) {
                return;
            }
            set_tracking(true);
            debug!(
                component = "repartition-loop",
                event = "tracking_window_opened",
                window_ms = tracking.as_millis() as u64,
                "tracking enabled"
            );
            if !gate.sleep(tracking) {
                return;
            }
            repartition();
        })
        .expect("failed to spawn repartition thread")
}
