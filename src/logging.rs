//! Structured logging setup.
//!
//! The interpreter itself only emits `tracing` events; installing a
//! subscriber is left to the embedding application. [`init_tracing`] is a
//! convenience for binaries and tests.

use crate::semantics::StepSummary;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Environment variable holding the filter directives, e.g. `harel=debug`.
pub const LOG_ENV: &str = "HAREL_LOG";

/// Target used by `log` actions in executable content.
pub const LOG_ACTION_TARGET: &str = "harel::log";

/// Installs a console subscriber filtered by [`LOG_ENV`] (default `info`).
///
/// Safe to call more than once, and a no-op when another global subscriber
/// is already installed.
pub fn init_tracing() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(filter),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }
    });
}

/// Logs one completed microstep.
pub fn log_step(session: &str, summary: &StepSummary) {
    tracing::debug!(
        session = %session,
        event = summary.event.as_deref().unwrap_or("<eventless>"),
        exited = ?summary.exited,
        entered = ?summary.entered,
        transitions = summary.transitions.len(),
        "microstep"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing();
        init_tracing();
        assert!(LOGGER_INITIALIZED.get().is_some());
    }
}
