//! The record of one microstep.

use crate::core::{Document, StateId, Status, TransitionId};
use crate::event::TriggerEvent;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Transitions reachable from one active atomic state, highest priority first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub origin: StateId,
    pub transitions: Vec<TransitionId>,
}

/// Everything computed while processing one event (or the eventless step).
///
/// A step starts with the status before it and is filled in phase by phase:
/// candidates, selected transitions, exit and entry lists, and finally the
/// status after it.
#[derive(Clone, Debug)]
pub struct Step {
    pub(crate) event: Option<TriggerEvent>,
    pub(crate) before: Status,
    pub(crate) after: Status,
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) transitions: Vec<TransitionId>,
    pub(crate) exit_list: Vec<StateId>,
    pub(crate) entry_list: Vec<StateId>,
    pub(crate) target_states: BTreeSet<StateId>,
    pub(crate) default_entry: BTreeSet<StateId>,
    pub(crate) history_transitions: BTreeMap<StateId, TransitionId>,
    pub(crate) states_to_invoke: BTreeSet<StateId>,
}

impl Step {
    pub fn new(event: Option<TriggerEvent>, before: Status) -> Self {
        Self {
            event,
            after: before.clone(),
            before,
            candidates: Vec::new(),
            transitions: Vec::new(),
            exit_list: Vec::new(),
            entry_list: Vec::new(),
            target_states: BTreeSet::new(),
            default_entry: BTreeSet::new(),
            history_transitions: BTreeMap::new(),
            states_to_invoke: BTreeSet::new(),
        }
    }

    pub fn event(&self) -> Option<&TriggerEvent> {
        self.event.as_ref()
    }

    pub fn before(&self) -> &Status {
        &self.before
    }

    pub fn after(&self) -> &Status {
        &self.after
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Transitions that fired, in priority order.
    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    /// States exited, deepest first.
    pub fn exit_list(&self) -> &[StateId] {
        &self.exit_list
    }

    /// States entered, outermost first.
    pub fn entry_list(&self) -> &[StateId] {
        &self.entry_list
    }

    /// Compound states entered through their initial transition.
    pub fn default_entry(&self) -> &BTreeSet<StateId> {
        &self.default_entry
    }

    /// Entered states that declare invokes.
    pub fn states_to_invoke(&self) -> &BTreeSet<StateId> {
        &self.states_to_invoke
    }

    pub fn has_transitions(&self) -> bool {
        !self.transitions.is_empty()
    }

    pub fn summary(&self, document: &Document) -> StepSummary {
        StepSummary {
            event: self.event.as_ref().map(|e| e.name.clone()),
            transitions: self
                .transitions
                .iter()
                .map(|tid| {
                    let transition = document.transition(*tid);
                    FiredTransition {
                        source: document.id_of(transition.source()).to_string(),
                        targets: document.ids_of(transition.targets()),
                    }
                })
                .collect(),
            exited: document.ids_of(&self.exit_list),
            entered: document.ids_of(&self.entry_list),
            active: document.ids_of(self.after.all_states()),
        }
    }
}

/// A fired transition, by state ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredTransition {
    pub source: String,
    pub targets: Vec<String>,
}

/// Id-based account of a microstep, returned by the executor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub event: Option<String>,
    pub transitions: Vec<FiredTransition>,
    /// In exit order.
    pub exited: Vec<String>,
    /// In entry order.
    pub entered: Vec<String>,
    /// Active states after the step, in document order.
    pub active: Vec<String>,
}
