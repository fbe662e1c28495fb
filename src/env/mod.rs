//! Collaborators the interpreter delegates to.
//!
//! The executor never evaluates expressions, delivers events or starts
//! services itself. Those concerns sit behind the traits in this module and
//! are injected through the [`ExecutorBuilder`](crate::builder::ExecutorBuilder).

pub mod context;
pub mod dispatcher;
pub mod evaluator;
pub mod invoke;
pub mod reporter;

pub use context::{is_system_variable, Context, ContextStore, ScopeId};
pub use dispatcher::{DispatchError, EventDispatcher, LoopbackDispatcher, NullDispatcher, SendRequest};
pub use evaluator::{is_member, EvaluationError, Evaluator, MinimalEvaluator, NULL_DATAMODEL};
pub use invoke::{InvokeRequest, InvokerError, InvokerManager, NoopInvokerManager};
pub use reporter::{CollectingErrorReporter, ErrorKind, ErrorReporter, ReportedError, TracingErrorReporter};

use std::sync::Arc;

/// The injected collaborators of one executor.
pub struct Environment {
    pub(crate) evaluator: Box<dyn Evaluator>,
    pub(crate) dispatcher: Box<dyn EventDispatcher>,
    pub(crate) reporter: Arc<dyn ErrorReporter>,
    pub(crate) invoker: Box<dyn InvokerManager>,
}

impl Environment {
    pub fn new(
        evaluator: Box<dyn Evaluator>,
        dispatcher: Box<dyn EventDispatcher>,
        reporter: Arc<dyn ErrorReporter>,
        invoker: Box<dyn InvokerManager>,
    ) -> Self {
        Self {
            evaluator,
            dispatcher,
            reporter,
            invoker,
        }
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    pub fn reporter(&self) -> &dyn ErrorReporter {
        self.reporter.as_ref()
    }
}
