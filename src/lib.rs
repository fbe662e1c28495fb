//! Harel: an interpreter for hierarchical, concurrent statecharts
//!
//! Harel runs SCXML-style statecharts: compound and parallel states, history,
//! final states with completion events, eventless and internal transitions,
//! and executable content. The model is an immutable [`Document`] shared by
//! any number of sessions; each [`Executor`] owns the mutable state of one
//! session and delegates expression evaluation, event delivery, service
//! invocation and error reporting to injected collaborators.
//!
//! # Core Concepts
//!
//! - **Document**: Arena of state nodes addressed by [`StateId`](core::StateId),
//!   with precomputed transition paths
//! - **Microstep**: One set of non-conflicting transitions fired for one event
//! - **Macrostep**: An external event followed by every eventless transition
//!   and internal event it enables
//! - **Snapshot**: Serializable session state for checkpoint and resume
//!
//! # Example
//!
//! ```rust
//! use harel::builder::{DocumentBuilder, ExecutorBuilder, StateBuilder, TransitionBuilder};
//! use harel::env::MinimalEvaluator;
//! use harel::TriggerEvent;
//! use std::sync::Arc;
//!
//! let document = DocumentBuilder::new()
//!     .state(
//!         StateBuilder::new("A")
//!             .state(StateBuilder::new("A1").transition(TransitionBuilder::on("go").to("A2")))
//!             .state(StateBuilder::new("A2")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let mut executor = ExecutorBuilder::new(Arc::new(document))
//!     .evaluator(MinimalEvaluator)
//!     .build()
//!     .unwrap();
//!
//! executor.go().unwrap();
//! assert_eq!(executor.active_ids(), vec!["A", "A1"]);
//!
//! executor.trigger_event(TriggerEvent::signal("go")).unwrap();
//! assert_eq!(executor.active_ids(), vec!["A", "A2"]);
//! ```

pub mod builder;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod env;
pub mod event;
pub mod executor;
pub mod legality;
pub mod logging;
pub mod semantics;

// Re-export commonly used types
pub use builder::{BuildError, DocumentBuilder, ExecutorBuilder, StateBuilder, TransitionBuilder};
pub use checkpoint::{CheckpointError, Snapshot};
pub use config::ExecutorConfig;
pub use core::{Document, StateId, Status};
pub use event::{EventKind, TriggerEvent};
pub use executor::{EventQueue, Executor, ExecutorError};
pub use semantics::StepSummary;
