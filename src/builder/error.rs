//! Build errors for documents and executors.

use crate::config::ConfigError;
use thiserror::Error;

/// A structural problem found while assembling a document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("Duplicate state id '{0}'")]
    DuplicateId(String),

    #[error("Transition of '{state}' targets unknown state '{target}'")]
    UnresolvedTarget { state: String, target: String },

    #[error("Targets {targets:?} of '{state}' cannot be active together")]
    IllegalMultiTarget { state: String, targets: Vec<String> },

    #[error("Initial transition of '{state}' must target its descendants, found '{target}'")]
    IllegalInitial { state: String, target: String },

    #[error("State '{0}' has an initial transition but is not compound")]
    InitialOnNonCompound(String),

    #[error("Default of history '{history}' must target {expected} of '{parent}', found '{target}'")]
    IllegalHistoryDefault {
        history: String,
        parent: String,
        target: String,
        expected: &'static str,
    },

    #[error("History '{history}' belongs to state '{state}' which has no children")]
    HistoryOnAtomicState { history: String, state: String },

    #[error("Final state '{0}' cannot have children")]
    FinalWithChildren(String),

    #[error("Parallel state '{0}' has no regions")]
    EmptyParallel(String),

    #[error("Invoke in state '{0}' has no type")]
    InvokeWithoutType(String),
}

/// Errors that can occur when building documents and executors.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Document has no states. Add at least one with .state(...)")]
    NoStates,

    #[error("Document is invalid: {}", summarize(.0))]
    Invalid(Vec<ModelError>),

    #[error("Evaluator not specified. Call .evaluator(...) before .build()")]
    MissingEvaluator,

    #[error("Document declares datamodel '{document}' but the evaluator implements '{evaluator}'")]
    IncompatibleDatamodel { document: String, evaluator: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BuildError {
    /// The model errors of an [`BuildError::Invalid`] document.
    pub fn model_errors(&self) -> &[ModelError] {
        match self {
            Self::Invalid(errors) => errors,
            _ => &[],
        }
    }
}

fn summarize(errors: &[ModelError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
