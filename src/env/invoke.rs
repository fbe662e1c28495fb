//! Invoked service seam.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// A service to start for a state that stayed active through a macrostep.
#[derive(Clone, Debug, PartialEq)]
pub struct InvokeRequest {
    pub invoke_id: String,
    /// Id of the invoking state.
    pub state: String,
    pub kind: String,
    pub src: Option<String>,
    pub params: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokerError {
    #[error("No invoker registered for type '{0}'")]
    UnknownType(String),

    #[error("Invoke '{invoke_id}' failed: {message}")]
    Failed { invoke_id: String, message: String },
}

/// Starts and cancels invoked services on behalf of an executor.
pub trait InvokerManager: Send {
    fn start(&mut self, request: InvokeRequest) -> Result<(), InvokerError>;

    fn cancel(&mut self, invoke_id: &str) -> Result<(), InvokerError>;
}

/// Accepts every request without starting anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopInvokerManager;

impl InvokerManager for NoopInvokerManager {
    fn start(&mut self, request: InvokeRequest) -> Result<(), InvokerError> {
        tracing::debug!(invoke_id = %request.invoke_id, kind = %request.kind, "ignoring invoke");
        Ok(())
    }

    fn cancel(&mut self, invoke_id: &str) -> Result<(), InvokerError> {
        tracing::debug!(invoke_id = %invoke_id, "ignoring invoke cancel");
        Ok(())
    }
}
