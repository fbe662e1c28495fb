//! Legality checking of active configurations.
//!
//! Uses Stillwater's `Validation` to accumulate every rule a configuration
//! breaks in a single pass.
//!
//! # Example
//!
//! ```rust
//! use harel::builder::{DocumentBuilder, StateBuilder};
//! use harel::legality::{check_configuration, ConfigurationViolation};
//! use std::collections::BTreeSet;
//! use stillwater::validation::Validation;
//!
//! let document = DocumentBuilder::new()
//!     .state(
//!         StateBuilder::parallel("P")
//!             .state(StateBuilder::new("R1"))
//!             .state(StateBuilder::new("R2")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let only_r1: BTreeSet<_> = [document.lookup("R1").unwrap()].into_iter().collect();
//! match check_configuration(&document, &only_r1) {
//!     Validation::Failure(errors) => assert!(matches!(
//!         errors.iter().next(),
//!         Some(ConfigurationViolation::IncompleteParallel { .. })
//!     )),
//!     Validation::Success(_) => unreachable!(),
//! }
//! ```

pub mod rules;
pub mod violations;

pub use rules::check_configuration;
pub use violations::{ConfigurationViolation, LegalityPolicy};
