//! Bounded blocking queue used for worker ingress and tracker batches.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;

/// Bounded FIFO queue with blocking push and pop.
///
/// Producers block while the queue is at capacity; consumers block while it
/// is empty. Items are delivered strictly in push order.
pub struct BoundedQueue<T> {
    capacity: usize,
    inner: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Pushes an item, blocking while the queue is full.
    pub fn push(&self, item: T) {
        let mut queue = self.inner.lock();
        while queue.len() >= self.capacity {
            self.not_full.wait(&mut queue);
        }
        queue.push_back(item);
        self.not_empty.notify_one();
    }

    /// Pops the oldest item, blocking while the queue is empty.
    pub fn pop(&self) -> T {
        let mut queue = self.inner.lock();
        loop {
            if let Some(item) = queue.pop_front() {
                self.not_full.notify_one();
                return item;
            }
            self.not_empty.wait(&mut queue);
        }
    }

    /// Pops the oldest item if one is present.
    pub fn try_pop(&self) -> Option<T> {
        let mut queue = self.inner.lock();
        let item = queue.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Discards all queued items and returns how many were dropped.
    pub fn drain(&self) -> usize {
        let mut queue = self.inner.lock();
        let dropped = queue.len();
        queue.clear();
        self.not_full.notify_all();
        dropped
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Checks whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
