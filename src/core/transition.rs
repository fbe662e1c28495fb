//! Transitions between states.

use crate::core::action::Action;
use crate::core::node::StateId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena index of a transition inside a [`Document`](crate::core::Document).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransitionId(pub(crate) u32);

impl TransitionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Whether a transition may avoid exiting its compound source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransitionKind {
    #[default]
    External,
    /// Does not exit the source when it is compound and every target is a
    /// descendant of it.
    Internal,
}

/// Descriptor matching any event name.
pub const WILDCARD: &str = "*";

/// A transition declared on a state.
#[derive(Clone, Debug)]
pub struct Transition {
    pub(crate) index: TransitionId,
    pub(crate) source: StateId,
    pub(crate) events: Vec<String>,
    pub(crate) cond: Option<String>,
    pub(crate) targets: Vec<StateId>,
    pub(crate) kind: TransitionKind,
    pub(crate) actions: Vec<Action>,
}

impl Transition {
    pub fn id(&self) -> TransitionId {
        self.index
    }

    pub fn source(&self) -> StateId {
        self.source
    }

    /// Event descriptors; empty for eventless transitions.
    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn cond(&self) -> Option<&str> {
        self.cond.as_deref()
    }

    pub fn targets(&self) -> &[StateId] {
        &self.targets
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_eventless(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_targetless(&self) -> bool {
        self.targets.is_empty()
    }

    /// Whether this transition is triggered by `event`.
    ///
    /// `None` stands for the eventless step, which only eventless
    /// transitions take part in.
    pub fn matches(&self, event: Option<&str>) -> bool {
        match event {
            None => self.is_eventless(),
            Some(name) => self
                .events
                .iter()
                .any(|descriptor| descriptor_matches(descriptor, name)),
        }
    }
}

/// Exact name match, or the `*` wildcard.
pub fn descriptor_matches(descriptor: &str, name: &str) -> bool {
    descriptor == WILDCARD || descriptor == name
}

/// Splits a space separated event attribute into descriptors.
pub(crate) fn parse_descriptors(events: &str) -> Vec<String> {
    events.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(events: &[&str]) -> Transition {
        Transition {
            index: TransitionId(0),
            source: StateId(0),
            events: events.iter().map(|e| e.to_string()).collect(),
            cond: None,
            targets: Vec::new(),
            kind: TransitionKind::External,
            actions: Vec::new(),
        }
    }

    #[test]
    fn eventless_transition_only_matches_eventless_step() {
        let t = transition(&[]);
        assert!(t.matches(None));
        assert!(!t.matches(Some("go")));
    }

    #[test]
    fn named_transition_matches_exact_names() {
        let t = transition(&["go", "stop"]);
        assert!(t.matches(Some("go")));
        assert!(t.matches(Some("stop")));
        assert!(!t.matches(Some("go.now")));
        assert!(!t.matches(None));
    }

    #[test]
    fn wildcard_matches_every_event() {
        let t = transition(&["*"]);
        assert!(t.matches(Some("anything")));
        assert!(!t.matches(None));
    }

    #[test]
    fn descriptors_split_on_whitespace() {
        assert_eq!(parse_descriptors(" a  b\tc "), vec!["a", "b", "c"]);
        assert!(parse_descriptors("").is_empty());
    }
}
