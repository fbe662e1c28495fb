//! Read-only view of a configuration at one point in time.

use crate::core::configuration::StateConfiguration;
use crate::core::document::Document;
use crate::core::node::{NodeKind, StateId};
use std::collections::BTreeSet;

/// Snapshot of the active configuration, taken before and after each step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
    states: BTreeSet<StateId>,
    all_states: BTreeSet<StateId>,
    final_state: Option<StateId>,
    pending_events: usize,
}

impl Status {
    /// Captures `configuration`; `pending_events` is the number of internal
    /// events still queued.
    pub fn capture(document: &Document, configuration: &StateConfiguration, pending_events: usize) -> Self {
        let states = configuration.states().clone();
        let all_states = document.ancestor_closure(&states, &BTreeSet::new());
        let final_state = match states.iter().next() {
            Some(&only) if states.len() == 1 => {
                let node = document.node(only);
                (node.kind() == NodeKind::Final && node.parent().is_none()).then_some(only)
            }
            _ => None,
        };
        Self {
            states,
            all_states,
            final_state,
            pending_events,
        }
    }

    /// Active atomic states.
    pub fn states(&self) -> &BTreeSet<StateId> {
        &self.states
    }

    /// Active atomic states and all of their ancestors.
    pub fn all_states(&self) -> &BTreeSet<StateId> {
        &self.all_states
    }

    pub fn is_active(&self, state: StateId) -> bool {
        self.all_states.contains(&state)
    }

    /// The top-level final state the machine rests in, if any.
    pub fn final_state(&self) -> Option<StateId> {
        self.final_state
    }

    pub fn pending_events(&self) -> usize {
        self.pending_events
    }

    /// The machine is in a top-level final state with nothing left to process.
    pub fn is_final(&self) -> bool {
        self.final_state.is_some() && self.pending_events == 0
    }

    pub(crate) fn with_pending_events(mut self, pending_events: usize) -> Self {
        self.pending_events = pending_events;
        self
    }
}
