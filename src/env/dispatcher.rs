//! Outbound event dispatching seam.

use crate::event::TriggerEvent;
use crate::executor::EventQueue;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Target addressing the sending session itself through its external queue.
pub const SESSION_TARGET: &str = "#_scxml_session";

/// An event leaving the statechart through a `send` action.
#[derive(Clone, Debug, PartialEq)]
pub struct SendRequest {
    pub send_id: String,
    pub event: String,
    pub target: Option<String>,
    pub target_type: Option<String>,
    pub data: Option<Value>,
    pub delay: Duration,
    /// Session id of the sender.
    pub origin: String,
}

impl SendRequest {
    pub fn to_event(&self) -> TriggerEvent {
        let mut event = TriggerEvent::signal(self.event.clone())
            .with_send_id(self.send_id.clone())
            .with_origin(self.origin.clone());
        event.data = self.data.clone();
        event
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unsupported send target '{0}'")]
    UnsupportedTarget(String),

    #[error("Unsupported send target type '{0}'")]
    UnsupportedTargetType(String),
}

/// Delivers `send` actions that do not target the internal queue.
pub trait EventDispatcher: Send {
    fn send(&mut self, request: SendRequest) -> Result<(), DispatchError>;

    /// Cancels a delayed send that has not been delivered yet.
    fn cancel(&mut self, send_id: &str);
}

/// Drops every event after logging it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullDispatcher;

impl EventDispatcher for NullDispatcher {
    fn send(&mut self, request: SendRequest) -> Result<(), DispatchError> {
        tracing::debug!(event = %request.event, send_id = %request.send_id, "dropping send");
        Ok(())
    }

    fn cancel(&mut self, send_id: &str) {
        tracing::debug!(send_id = %send_id, "nothing to cancel");
    }
}

/// Delivers sends back into the session's own external queue.
///
/// Delayed sends wait on a background thread and can be cancelled until they fire.
#[derive(Clone, Debug)]
pub struct LoopbackDispatcher {
    queue: EventQueue,
    timers: Arc<Mutex<HashMap<String, Arc<AtomicBool>>>>,
}

impl LoopbackDispatcher {
    pub fn new(queue: EventQueue) -> Self {
        Self {
            queue,
            timers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of delayed sends still waiting.
    pub fn pending_timers(&self) -> usize {
        self.timers.lock().len()
    }
}

impl EventDispatcher for LoopbackDispatcher {
    fn send(&mut self, request: SendRequest) -> Result<(), DispatchError> {
        if let Some(target_type) = request.target_type.as_deref() {
            if target_type != "scxml" {
                return Err(DispatchError::UnsupportedTargetType(target_type.to_string()));
            }
        }
        match request.target.as_deref() {
            None | Some("") | Some(SESSION_TARGET) => {}
            Some(other) => return Err(DispatchError::UnsupportedTarget(other.to_string())),
        }

        let event = request.to_event();
        if request.delay.is_zero() {
            self.queue.push(event);
            return Ok(());
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        self.timers
            .lock()
            .insert(request.send_id.clone(), Arc::clone(&cancelled));

        let queue = self.queue.clone();
        let timers = Arc::clone(&self.timers);
        let send_id = request.send_id;
        let delay = request.delay;
        thread::spawn(move || {
            thread::sleep(delay);
            if !cancelled.load(Ordering::SeqCst) {
                queue.push(event);
            }
            // a later send may have reused the id
            let mut timers = timers.lock();
            if timers.get(&send_id).is_some_and(|flag| Arc::ptr_eq(flag, &cancelled)) {
                timers.remove(&send_id);
            }
        });
        Ok(())
    }

    fn cancel(&mut self, send_id: &str) {
        if let Some(flag) = self.timers.lock().remove(send_id) {
            flag.store(true, Ordering::SeqCst);
            tracing::debug!(send_id = %send_id, "cancelled delayed send");
        }
    }
}
