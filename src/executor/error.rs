//! Executor error types.

use crate::core::ConfigurationError;
use thiserror::Error;

/// Fatal errors that stop a running executor.
///
/// Recoverable problems (failed guards, failing actions, dispatch errors) are
/// reported through the [`ErrorReporter`](crate::env::ErrorReporter) instead.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Configuration update failed: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Step produced an illegal configuration: {0}")]
    IllegalConfiguration(String),
}
