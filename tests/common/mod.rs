//! Shared fixtures for integration tests.

#![allow(dead_code)]

use harel::builder::ExecutorBuilder;
use harel::core::Document;
use harel::env::{
    is_member, CollectingErrorReporter, Context, DispatchError, EvaluationError, Evaluator, EventDispatcher,
    InvokeRequest, InvokerError, InvokerManager, SendRequest,
};
use harel::env::evaluator::parse_in_predicate;
use harel::{Executor, ExecutorConfig};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

pub const EXPR_DATAMODEL: &str = "expr";

/// A tiny expression language for tests.
///
/// Supports JSON literals, `'single quoted'` strings, variable lookup,
/// `In(id)`, prefix `!`, and one binary operator out of `==`, `!=`, `<`,
/// `>`, `+` (operators must be surrounded by spaces).
#[derive(Clone, Copy, Debug, Default)]
pub struct ExprEvaluator;

impl ExprEvaluator {
    fn failed(expr: &str, message: impl Into<String>) -> EvaluationError {
        EvaluationError::Failed {
            expr: expr.to_string(),
            message: message.into(),
        }
    }

    fn number(expr: &str, value: &Value) -> Result<f64, EvaluationError> {
        value
            .as_f64()
            .ok_or_else(|| Self::failed(expr, format!("{value} is not a number")))
    }

    fn binary(&self, context: &Context<'_>, expr: &str) -> Option<Result<Value, EvaluationError>> {
        for op in [" == ", " != ", " < ", " > ", " + "] {
            if let Some(position) = expr.find(op) {
                let (left, right) = (&expr[..position], &expr[position + op.len()..]);
                return Some(self.apply(context, expr, op.trim(), left, right));
            }
        }
        None
    }

    fn apply(
        &self,
        context: &Context<'_>,
        expr: &str,
        op: &str,
        left: &str,
        right: &str,
    ) -> Result<Value, EvaluationError> {
        let left = self.eval(context, left)?;
        let right = self.eval(context, right)?;
        match op {
            "==" => Ok(Value::Bool(left == right)),
            "!=" => Ok(Value::Bool(left != right)),
            "<" => Ok(Value::Bool(Self::number(expr, &left)? < Self::number(expr, &right)?)),
            ">" => Ok(Value::Bool(Self::number(expr, &left)? > Self::number(expr, &right)?)),
            _ => match (left.as_i64(), right.as_i64()) {
                (Some(a), Some(b)) => Ok(Value::from(a + b)),
                _ => Ok(Value::from(Self::number(expr, &left)? + Self::number(expr, &right)?)),
            },
        }
    }
}

impl Evaluator for ExprEvaluator {
    fn datamodel(&self) -> &str {
        EXPR_DATAMODEL
    }

    fn eval(&self, context: &Context<'_>, expr: &str) -> Result<Value, EvaluationError> {
        let expr = expr.trim();
        if let Some(state) = parse_in_predicate(expr) {
            return Ok(Value::Bool(is_member(context, state)));
        }
        if let Some(result) = self.binary(context, expr) {
            return result;
        }
        if let Some(inner) = expr.strip_prefix('!') {
            return match self.eval(context, inner)? {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                _ => Err(EvaluationError::NotBoolean {
                    expr: inner.to_string(),
                }),
            };
        }
        if let Some(text) = expr.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            return Ok(Value::String(text.to_string()));
        }
        if let Ok(value) = serde_json::from_str::<Value>(expr) {
            return Ok(value);
        }
        context
            .get(expr)
            .cloned()
            .ok_or_else(|| Self::failed(expr, "undefined variable"))
    }

    fn eval_cond(&self, context: &Context<'_>, expr: &str) -> Result<bool, EvaluationError> {
        match self.eval(context, expr)? {
            Value::Bool(verdict) => Ok(verdict),
            _ => Err(EvaluationError::NotBoolean {
                expr: expr.to_string(),
            }),
        }
    }
}

/// Records every send; clones share the log.
#[derive(Clone, Debug, Default)]
pub struct RecordingDispatcher {
    pub sent: Arc<Mutex<Vec<SendRequest>>>,
    pub cancelled: Arc<Mutex<Vec<String>>>,
}

impl RecordingDispatcher {
    pub fn events(&self) -> Vec<String> {
        self.sent.lock().iter().map(|r| r.event.clone()).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl EventDispatcher for RecordingDispatcher {
    fn send(&mut self, request: SendRequest) -> Result<(), DispatchError> {
        if request.target.as_deref() == Some("#unreachable") {
            return Err(DispatchError::UnsupportedTarget("#unreachable".to_string()));
        }
        self.sent.lock().push(request);
        Ok(())
    }

    fn cancel(&mut self, send_id: &str) {
        self.cancelled.lock().push(send_id.to_string());
    }
}

/// Records started and cancelled invokes; fails for type `broken`.
#[derive(Clone, Debug, Default)]
pub struct RecordingInvoker {
    pub started: Arc<Mutex<Vec<InvokeRequest>>>,
    pub cancelled: Arc<Mutex<Vec<String>>>,
}

impl RecordingInvoker {
    pub fn started_ids(&self) -> Vec<String> {
        self.started.lock().iter().map(|r| r.invoke_id.clone()).collect()
    }
}

impl InvokerManager for RecordingInvoker {
    fn start(&mut self, request: InvokeRequest) -> Result<(), InvokerError> {
        if request.kind == "broken" {
            return Err(InvokerError::UnknownType(request.kind));
        }
        self.started.lock().push(request);
        Ok(())
    }

    fn cancel(&mut self, invoke_id: &str) -> Result<(), InvokerError> {
        self.cancelled.lock().push(invoke_id.to_string());
        Ok(())
    }
}

/// Collaborators of a test executor, kept for assertions.
pub struct Harness {
    pub executor: Executor,
    pub reporter: CollectingErrorReporter,
    pub dispatcher: RecordingDispatcher,
    pub invoker: RecordingInvoker,
}

pub fn harness(document: Document) -> Harness {
    harness_with(Arc::new(document), ExecutorConfig::default())
}

pub fn harness_with(document: Arc<Document>, config: ExecutorConfig) -> Harness {
    let reporter = CollectingErrorReporter::new();
    let dispatcher = RecordingDispatcher::default();
    let invoker = RecordingInvoker::default();
    let executor = ExecutorBuilder::new(document)
        .evaluator(ExprEvaluator)
        .error_reporter(reporter.clone())
        .dispatcher(dispatcher.clone())
        .invoker_manager(invoker.clone())
        .config(config)
        .build()
        .expect("test executor should build");
    Harness {
        executor,
        reporter,
        dispatcher,
        invoker,
    }
}
