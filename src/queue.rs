//! Blocking work queue
//!
//! Unbounded multi-producer/multi-consumer FIFO with a one-shot "no more
//! input" latch. Used twice per file: raw lines to the workers, and accepted
//! lines to the writer. One mutex and one condition variable back both the
//! single and the batched pop, so the two can never disagree about what is
//! buffered.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Blocking FIFO with close and reset
pub struct WorkQueue<T> {
    state: Mutex<State<T>>,
    ready: Condvar,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // Nothing in here can leave the state half-updated, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append an item; never blocks
    pub fn push(&self, item: T) {
        self.lock().items.push_back(item);
        self.ready.notify_one();
    }

    /// Append many items at once
    pub fn push_all<I: IntoIterator<Item = T>>(&self, items: I) {
        self.lock().items.extend(items);
        self.ready.notify_all();
    }

    /// Block until an item is available or the queue is closed
    ///
    /// Returns `None` only when the queue is closed and drained.
    pub fn pop_one(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self.ready.wait(state).unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Block until at least one item is available or the queue is closed,
    /// then take up to `max` items without waiting again
    ///
    /// An empty batch means the queue is closed and drained.
    pub fn pop_batch(&self, max: usize) -> Vec<T> {
        let max = max.max(1);
        let mut state = self.lock();
        while state.items.is_empty() && !state.closed {
            state = self.ready.wait(state).unwrap_or_else(|e| e.into_inner());
        }

        let take = state.items.len().min(max);
        let batch: Vec<T> = state.items.drain(..take).collect();

        // Leftovers for other waiters; notify_one from push may have woken only us
        if !state.items.is_empty() {
            self.ready.notify_one();
        }

        batch
    }

    /// Signal that nothing more will be pushed; buffered items still drain
    pub fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }

    /// Drop buffered items and reopen for the next file
    pub fn reset(&self) {
        let mut state = self.lock();
        state.items.clear();
        state.closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
