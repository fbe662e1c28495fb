//! Step semantics of the interpreter.
//!
//! A microstep selects the enabled, non-conflicting transitions for one event,
//! computes the states to exit and enter, records histories, runs executable
//! content and finally updates the configuration. The
//! [`Executor`](crate::executor::Executor) strings microsteps together into
//! macrosteps.

pub mod actions;
pub mod engine;
pub mod step;

pub use engine::Semantics;
pub use step::{Candidate, FiredTransition, Step, StepSummary};
