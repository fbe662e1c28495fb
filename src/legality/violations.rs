//! Configuration violations and the policy applied when one is found.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rule broken by a set of active states.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationViolation {
    #[error("Parallel state '{parallel}' has {active} of {regions} regions active")]
    IncompleteParallel {
        parallel: String,
        active: usize,
        regions: usize,
    },

    #[error("Compound state '{state}' has multiple active children: {children:?}")]
    MultipleActiveChildren { state: String, children: Vec<String> },

    #[error("Multiple top-level states are active: {states:?}")]
    MultipleTopLevel { states: Vec<String> },
}

impl ConfigurationViolation {
    /// The state the violation is attached to, if there is a single one.
    pub fn state(&self) -> Option<&str> {
        match self {
            Self::IncompleteParallel { parallel, .. } => Some(parallel),
            Self::MultipleActiveChildren { state, .. } => Some(state),
            Self::MultipleTopLevel { .. } => None,
        }
    }
}

/// What the executor does after a microstep produced an illegal configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalityPolicy {
    /// Report the violations and keep running.
    #[default]
    Warn,

    /// Report the violations and stop with an error.
    Fatal,
}
