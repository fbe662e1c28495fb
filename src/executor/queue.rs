//! Shared external event queue.

use crate::event::TriggerEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// FIFO of external events.
///
/// Clones share the same queue, so producers on other threads (dispatchers,
/// timers, invoked services) can push while the executor drains it with
/// [`Executor::process_pending`](crate::executor::Executor::process_pending).
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    inner: Arc<Mutex<VecDeque<TriggerEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: TriggerEvent) {
        self.inner.lock().push_back(event);
    }

    pub fn pop(&self) -> Option<TriggerEvent> {
        self.inner.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}
