//! Builder API for statechart documents and executors.
//!
//! Documents are described with nested [`StateBuilder`]s and lowered into an
//! immutable [`Document`](crate::core::Document) by [`DocumentBuilder::build`],
//! which resolves targets, generates ids for anonymous states and validates
//! the structure. [`ExecutorBuilder`] then wires a document to its
//! collaborators.
//!
//! # Example
//!
//! ```rust
//! use harel::builder::{DocumentBuilder, HistoryBuilder, StateBuilder, TransitionBuilder};
//!
//! let document = DocumentBuilder::new()
//!     .name("player")
//!     .state(
//!         StateBuilder::new("On")
//!             .history(HistoryBuilder::shallow("H"))
//!             .state(StateBuilder::new("Playing").transition(TransitionBuilder::on("pause").to("Paused")))
//!             .state(StateBuilder::new("Paused").transition(TransitionBuilder::on("play").to("Playing")))
//!             .transition(TransitionBuilder::on("off").to("Off")),
//!     )
//!     .state(StateBuilder::new("Off").transition(TransitionBuilder::on("on").to("H")))
//!     .build()
//!     .unwrap();
//!
//! assert!(document.lookup("Paused").is_some());
//! ```

pub mod document;
pub mod error;
pub mod executor;
pub mod state;
pub mod transition;
pub mod validate;

pub use document::DocumentBuilder;
pub use error::{BuildError, ModelError};
pub use executor::ExecutorBuilder;
pub use state::{HistoryBuilder, StateBuilder};
pub use transition::TransitionBuilder;
pub use validate::{targets_are_compatible, validate_document};
