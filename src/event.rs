//! Trigger events delivered to a running statechart.

use crate::checkpoint::value;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Raised when executable content or a guard fails at runtime.
pub const ERROR_EXECUTION: &str = "error.execution";

/// Raised when an event cannot be dispatched to its target.
pub const ERROR_COMMUNICATION: &str = "error.communication";

/// Raised for platform-level failures outside the statechart.
pub const ERROR_PLATFORM: &str = "error.platform";

/// Prefix of the completion events raised when a compound or parallel state is done.
pub const DONE_STATE_PREFIX: &str = "done.state.";

/// Category of a [`TriggerEvent`].
///
/// `Cancel` is special: delivering it to an executor stops the machine
/// instead of being matched against transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EventKind {
    Call,
    Change,
    #[default]
    Signal,
    Time,
    Error,
    Cancel,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Change => "change",
            Self::Signal => "signal",
            Self::Time => "time",
            Self::Error => "error",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event with a name, a kind and an optional payload.
///
/// # Example
///
/// ```rust
/// use harel::{EventKind, TriggerEvent};
/// use serde_json::json;
///
/// let event = TriggerEvent::signal("order.placed").with_data(json!({"id": 7}));
/// assert_eq!(event.name, "order.placed");
/// assert_eq!(event.kind, EventKind::Signal);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub name: String,
    pub kind: EventKind,
    #[serde(default)]
    pub send_id: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub invoke_id: Option<String>,
    #[serde(default, with = "value::optional")]
    pub data: Option<Value>,
}

impl TriggerEvent {
    pub fn new(name: impl Into<String>, kind: EventKind) -> Self {
        Self {
            name: name.into(),
            kind,
            send_id: None,
            origin: None,
            invoke_id: None,
            data: None,
        }
    }

    pub fn signal(name: impl Into<String>) -> Self {
        Self::new(name, EventKind::Signal)
    }

    /// An error event such as [`ERROR_EXECUTION`].
    pub fn error(name: impl Into<String>) -> Self {
        Self::new(name, EventKind::Error)
    }

    /// The event that stops an executor when delivered.
    pub fn cancel() -> Self {
        Self::new("cancel", EventKind::Cancel)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_send_id(mut self, send_id: impl Into<String>) -> Self {
        self.send_id = Some(send_id.into());
        self
    }

    pub fn with_invoke_id(mut self, invoke_id: impl Into<String>) -> Self {
        self.invoke_id = Some(invoke_id.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == EventKind::Error
    }

    /// JSON view bound to the `_event` system variable while the event is processed.
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.kind.as_str(),
            "sendid": self.send_id,
            "origin": self.origin,
            "invokeid": self.invoke_id,
            "data": self.data,
        })
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}
