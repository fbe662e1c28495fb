//! Executable content attached to states and transitions.

use std::time::Duration;

/// Send target addressing the session's own internal queue.
pub const INTERNAL_TARGET: &str = "#_internal";

/// A named value passed along with a send or an invoke.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Param {
    pub name: String,
    pub expr: Option<String>,
    /// Datamodel location read when no expression is given.
    pub location: Option<String>,
}

impl Param {
    pub fn expr(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expr: Some(expr.into()),
            location: None,
        }
    }

    pub fn location(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expr: None,
            location: Some(location.into()),
        }
    }
}

/// Contents of a `send` action.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SendAction {
    pub id: Option<String>,
    pub event: Option<String>,
    /// Expression yielding the event name when `event` is absent.
    pub event_expr: Option<String>,
    pub target: Option<String>,
    pub target_type: Option<String>,
    pub delay: Option<Duration>,
    /// Datamodel variables copied into the event payload.
    pub namelist: Vec<String>,
    pub params: Vec<Param>,
    /// Expression whose value becomes the whole payload.
    pub content_expr: Option<String>,
}

impl SendAction {
    pub fn event(event: impl Into<String>) -> Self {
        Self {
            event: Some(event.into()),
            ..Self::default()
        }
    }

    pub fn event_expr(expr: impl Into<String>) -> Self {
        Self {
            event_expr: Some(expr.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn to(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn target_type(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.namelist.push(name.into());
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn content(mut self, expr: impl Into<String>) -> Self {
        self.content_expr = Some(expr.into());
        self
    }
}

/// One `if`/`elseif` arm.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    pub cond: String,
    pub actions: Vec<Action>,
}

/// Executable content.
///
/// Blocks of actions run in order; the first failing action aborts the rest
/// of its block and raises `error.execution`.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Assign to an existing datamodel variable.
    Assign { location: String, expr: String },
    /// Declare a variable in the current state's scope.
    Var { name: String, expr: Option<String> },
    Log {
        label: Option<String>,
        expr: Option<String>,
    },
    /// Raise an internal event.
    Raise { event: String },
    Send(SendAction),
    Cancel { send_id: String },
    If {
        branches: Vec<Branch>,
        otherwise: Vec<Action>,
    },
}

impl Action {
    pub fn assign(location: impl Into<String>, expr: impl Into<String>) -> Self {
        Self::Assign {
            location: location.into(),
            expr: expr.into(),
        }
    }

    pub fn var(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self::Var {
            name: name.into(),
            expr: Some(expr.into()),
        }
    }

    pub fn log(label: impl Into<String>, expr: impl Into<String>) -> Self {
        Self::Log {
            label: Some(label.into()),
            expr: Some(expr.into()),
        }
    }

    pub fn raise(event: impl Into<String>) -> Self {
        Self::Raise {
            event: event.into(),
        }
    }

    pub fn send(send: SendAction) -> Self {
        Self::Send(send)
    }

    pub fn cancel(send_id: impl Into<String>) -> Self {
        Self::Cancel {
            send_id: send_id.into(),
        }
    }

    /// A single-armed conditional.
    pub fn when(cond: impl Into<String>, actions: Vec<Action>) -> Self {
        Self::If {
            branches: vec![Branch {
                cond: cond.into(),
                actions,
            }],
            otherwise: Vec::new(),
        }
    }

    pub fn if_else(branches: Vec<Branch>, otherwise: Vec<Action>) -> Self {
        Self::If {
            branches,
            otherwise,
        }
    }
}
