//! Builder wiring a document to its collaborators.

use crate::builder::error::BuildError;
use crate::config::ExecutorConfig;
use crate::core::Document;
use crate::env::{
    Environment, ErrorReporter, EventDispatcher, Evaluator, InvokerManager, NoopInvokerManager, NullDispatcher,
    TracingErrorReporter,
};
use crate::executor::{EventQueue, Executor};
use std::sync::Arc;

/// Builder for an [`Executor`].
///
/// Only the evaluator is required. Events sent to external targets are
/// dropped by default, errors go to `tracing`, and invokes are not started.
pub struct ExecutorBuilder {
    document: Arc<Document>,
    evaluator: Option<Box<dyn Evaluator>>,
    dispatcher: Option<Box<dyn EventDispatcher>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    invoker: Option<Box<dyn InvokerManager>>,
    config: ExecutorConfig,
    queue: Option<EventQueue>,
}

impl ExecutorBuilder {
    pub fn new(document: Arc<Document>) -> Self {
        Self {
            document,
            evaluator: None,
            dispatcher: None,
            reporter: None,
            invoker: None,
            config: ExecutorConfig::default(),
            queue: None,
        }
    }

    /// Set the expression evaluator (required).
    pub fn evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    pub fn dispatcher(mut self, dispatcher: impl EventDispatcher + 'static) -> Self {
        self.dispatcher = Some(Box::new(dispatcher));
        self
    }

    pub fn error_reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    pub fn invoker_manager(mut self, invoker: impl InvokerManager + 'static) -> Self {
        self.invoker = Some(Box::new(invoker));
        self
    }

    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `queue` as the external event queue, e.g. one already shared with
    /// a [`LoopbackDispatcher`](crate::env::LoopbackDispatcher).
    pub fn event_queue(mut self, queue: EventQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    /// Build the executor.
    /// Returns an error if the evaluator is missing or does not implement
    /// the document's datamodel.
    pub fn build(self) -> Result<Executor, BuildError> {
        let evaluator = self.evaluator.ok_or(BuildError::MissingEvaluator)?;
        self.config.validate()?;

        if let Some(declared) = self.document.datamodel_kind() {
            if declared != evaluator.datamodel() {
                return Err(BuildError::IncompatibleDatamodel {
                    document: declared.to_string(),
                    evaluator: evaluator.datamodel().to_string(),
                });
            }
        }

        let env = Environment::new(
            evaluator,
            self.dispatcher.unwrap_or_else(|| Box::new(NullDispatcher)),
            self.reporter.unwrap_or_else(|| Arc::new(TracingErrorReporter)),
            self.invoker.unwrap_or_else(|| Box::new(NoopInvokerManager)),
        );

        Ok(Executor::new(
            self.document,
            env,
            self.config,
            self.queue.unwrap_or_default(),
        ))
    }
}
