//! The statechart model and the pure queries the interpreter is built on.

pub mod action;
pub mod configuration;
pub mod document;
pub mod history;
pub mod node;
pub mod path;
pub mod status;
pub mod transition;

pub use action::{Action, Branch, Param, SendAction, INTERNAL_TARGET};
pub use configuration::{ConfigurationError, StateConfiguration};
pub use document::{Ancestors, Document};
pub use history::HistoryStore;
pub use node::{Data, HistoryDepth, Invoke, NodeKind, StateId, StateNode};
pub use path::{in_conflict, states_exited, Path};
pub use status::Status;
pub use transition::{descriptor_matches, Transition, TransitionId, TransitionKind, WILDCARD};
