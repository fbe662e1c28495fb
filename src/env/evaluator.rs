//! Expression evaluation seam.

use crate::env::context::{Context, ALL_STATES_KEY};
use serde_json::Value;
use thiserror::Error;

/// Name of the datamodel understood by [`MinimalEvaluator`].
pub const NULL_DATAMODEL: &str = "null";

/// Errors returned by an [`Evaluator`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationError {
    #[error("Expression '{expr}' is not supported by the '{datamodel}' datamodel")]
    Unsupported { expr: String, datamodel: String },

    #[error("Failed to evaluate '{expr}': {message}")]
    Failed { expr: String, message: String },

    #[error("Expression '{expr}' did not produce a boolean")]
    NotBoolean { expr: String },
}

/// Evaluates datamodel expressions and guard conditions.
///
/// An executor owns exactly one evaluator, and its [`datamodel`](Evaluator::datamodel)
/// must match the one declared by the document, if any.
pub trait Evaluator: Send + Sync {
    /// Name of the datamodel this evaluator implements.
    fn datamodel(&self) -> &str;

    /// When true, every state shares the global scope instead of getting its own.
    fn requires_global_context(&self) -> bool {
        false
    }

    fn eval(&self, context: &Context<'_>, expr: &str) -> Result<Value, EvaluationError>;

    fn eval_cond(&self, context: &Context<'_>, expr: &str) -> Result<bool, EvaluationError>;
}

/// The `In(state)` predicate, answered from the `_ALL_STATES` system variable.
pub fn is_member(context: &Context<'_>, state_id: &str) -> bool {
    context
        .get(ALL_STATES_KEY)
        .and_then(Value::as_array)
        .map(|states| states.iter().any(|s| s.as_str() == Some(state_id)))
        .unwrap_or(false)
}

/// Extracts `id` from `In(id)`, `In('id')` or `In("id")`.
pub fn parse_in_predicate(expr: &str) -> Option<&str> {
    let inner = expr.trim().strip_prefix("In(")?.strip_suffix(')')?.trim();
    let unquoted = inner
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
        .unwrap_or(inner);
    Some(unquoted)
}

/// Evaluator for the `null` datamodel.
///
/// Values are the expression text itself; conditions support `true`,
/// `false` and `In(state)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinimalEvaluator;

impl Evaluator for MinimalEvaluator {
    fn datamodel(&self) -> &str {
        NULL_DATAMODEL
    }

    fn eval(&self, _context: &Context<'_>, expr: &str) -> Result<Value, EvaluationError> {
        Ok(Value::String(expr.to_string()))
    }

    fn eval_cond(&self, context: &Context<'_>, expr: &str) -> Result<bool, EvaluationError> {
        match expr.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => parse_in_predicate(other)
                .map(|state| is_member(context, state))
                .ok_or_else(|| EvaluationError::Unsupported {
                    expr: expr.to_string(),
                    datamodel: NULL_DATAMODEL.to_string(),
                }),
        }
    }
}
