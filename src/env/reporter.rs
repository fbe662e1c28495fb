//! Error reporting seam.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Category of a reported runtime problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NoInitial,
    IllegalConfig,
    NonDeterministic,
    UndefinedVariable,
    ExpressionError,
    ExecutionError,
    CommunicationError,
    InvokerError,
    LoopLimit,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoInitial => "NO_INITIAL",
            Self::IllegalConfig => "ILLEGAL_CONFIG",
            Self::NonDeterministic => "NON_DETERMINISTIC",
            Self::UndefinedVariable => "UNDEFINED_VARIABLE",
            Self::ExpressionError => "EXPRESSION_ERROR",
            Self::ExecutionError => "EXECUTION_ERROR",
            Self::CommunicationError => "COMMUNICATION_ERROR",
            Self::InvokerError => "INVOKER_ERROR",
            Self::LoopLimit => "LOOP_LIMIT",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives every non-fatal problem the interpreter encounters.
pub trait ErrorReporter: Send + Sync {
    /// `related` is the id of the state involved, when there is one.
    fn on_error(&self, kind: ErrorKind, message: &str, related: Option<&str>);
}

/// Forwards reports to `tracing` at warn level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn on_error(&self, kind: ErrorKind, message: &str, related: Option<&str>) {
        tracing::warn!(kind = %kind, related = related.unwrap_or(""), "{message}");
    }
}

/// A report captured by [`CollectingErrorReporter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportedError {
    pub kind: ErrorKind,
    pub message: String,
    pub related: Option<String>,
}

/// Keeps every report in memory. Clones share the same storage.
#[derive(Clone, Debug, Default)]
pub struct CollectingErrorReporter {
    errors: Arc<Mutex<Vec<ReportedError>>>,
}

impl CollectingErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<ReportedError> {
        self.errors.lock().clone()
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.errors.lock().iter().filter(|e| e.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    pub fn clear(&self) {
        self.errors.lock().clear();
    }
}

impl ErrorReporter for CollectingErrorReporter {
    fn on_error(&self, kind: ErrorKind, message: &str, related: Option<&str>) {
        tracing::debug!(kind = %kind, related = related.unwrap_or(""), "{message}");
        self.errors.lock().push(ReportedError {
            kind,
            message: message.to_string(),
            related: related.map(str::to_string),
        });
    }
}
