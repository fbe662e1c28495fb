//! Builder for transitions.

use crate::core::transition::parse_descriptors;
use crate::core::{Action, TransitionKind};

/// Fluent description of a transition; targets are state ids resolved when
/// the document is built.
///
/// # Example
///
/// ```rust
/// use harel::builder::TransitionBuilder;
/// use harel::core::Action;
///
/// let transition = TransitionBuilder::on("submit retry")
///     .to("Processing")
///     .when("In('Ready')")
///     .action(Action::raise("submitted"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct TransitionBuilder {
    pub(crate) events: Vec<String>,
    pub(crate) cond: Option<String>,
    pub(crate) targets: Vec<String>,
    pub(crate) kind: TransitionKind,
    pub(crate) actions: Vec<Action>,
}

impl TransitionBuilder {
    /// A transition triggered by any of the space separated `events`.
    pub fn on(events: &str) -> Self {
        Self {
            events: parse_descriptors(events),
            ..Self::default()
        }
    }

    /// A transition taken without an event as soon as its guard holds.
    pub fn eventless() -> Self {
        Self::default()
    }

    /// Adds space separated target ids.
    pub fn to(mut self, targets: &str) -> Self {
        self.targets.extend(parse_descriptors(targets));
        self
    }

    /// Guard condition, evaluated by the executor's evaluator.
    pub fn when(mut self, cond: impl Into<String>) -> Self {
        self.cond = Some(cond.into());
        self
    }

    pub fn internal(mut self) -> Self {
        self.kind = TransitionKind::Internal;
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }
}
