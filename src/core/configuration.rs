//! The mutable set of active states.

use crate::core::node::{StateId, StateNode};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors raised when the configuration is updated inconsistently.
///
/// These indicate a bug in the interpreter rather than in the document, so
/// the executor treats them as fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("State '{0}' is already active")]
    AlreadyActive(String),

    #[error("State '{0}' is not active")]
    NotActive(String),

    #[error("Pseudo-state '{0}' cannot be part of a configuration")]
    PseudoState(String),
}

/// Active states of one running statechart.
///
/// Keeps the full active set and, separately, its atomic leaves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateConfiguration {
    active: BTreeSet<StateId>,
    atomic: BTreeSet<StateId>,
}

impl StateConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_state(&mut self, node: &StateNode) -> Result<(), ConfigurationError> {
        if node.is_pseudo() {
            return Err(ConfigurationError::PseudoState(node.id().to_string()));
        }
        if !self.active.insert(node.index()) {
            return Err(ConfigurationError::AlreadyActive(node.id().to_string()));
        }
        if node.is_atomic() {
            self.atomic.insert(node.index());
        }
        Ok(())
    }

    pub fn exit_state(&mut self, node: &StateNode) -> Result<(), ConfigurationError> {
        if !self.active.remove(&node.index()) {
            return Err(ConfigurationError::NotActive(node.id().to_string()));
        }
        self.atomic.remove(&node.index());
        Ok(())
    }

    /// Every active state, compound ones included.
    pub fn active_states(&self) -> &BTreeSet<StateId> {
        &self.active
    }

    /// Active atomic states.
    pub fn states(&self) -> &BTreeSet<StateId> {
        &self.atomic
    }

    pub fn is_active(&self, state: StateId) -> bool {
        self.active.contains(&state)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.atomic.clear();
    }
}
