//! Execution of executable content, datamodel initialisation and invokes.

use crate::core::{Action, Data, Param, SendAction, StateId, INTERNAL_TARGET};
use crate::env::{is_system_variable, DispatchError, ErrorKind, EvaluationError, InvokeRequest, ScopeId, SendRequest};
use crate::event::{TriggerEvent, ERROR_COMMUNICATION, ERROR_EXECUTION};
use crate::logging::LOG_ACTION_TARGET;
use crate::semantics::engine::Semantics;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a block of executable content was aborted.
#[derive(Debug, Error)]
pub(crate) enum ActionError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("Assignment to undeclared variable '{0}'")]
    UndefinedVariable(String),

    #[error("System variable '{0}' is read-only")]
    ReadOnly(String),

    #[error("Send has neither an event nor an event expression")]
    MissingEvent,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl ActionError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Evaluation(_) => ErrorKind::ExpressionError,
            Self::UndefinedVariable(_) => ErrorKind::UndefinedVariable,
            Self::ReadOnly(_) | Self::MissingEvent => ErrorKind::ExecutionError,
            Self::Dispatch(_) => ErrorKind::CommunicationError,
        }
    }

    fn event(&self) -> &'static str {
        match self {
            Self::Dispatch(_) => ERROR_COMMUNICATION,
            _ => ERROR_EXECUTION,
        }
    }
}

/// Renders a value as an event name or log line: strings unquoted, the rest as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl Semantics<'_> {
    /// Runs a block on behalf of `state`. The first failure aborts the rest of
    /// the block, is reported, and raises an error event.
    pub(crate) fn run_actions(&mut self, actions: &[Action], state: StateId) {
        if actions.is_empty() {
            return;
        }
        if let Err(err) = self.execute_block(actions, state) {
            let document = self.document;
            self.env
                .reporter
                .on_error(err.kind(), &err.to_string(), Some(document.id_of(state)));
            self.instance.raise(TriggerEvent::error(err.event()));
        }
    }

    fn execute_block(&mut self, actions: &[Action], state: StateId) -> Result<(), ActionError> {
        for action in actions {
            self.execute(action, state)?;
        }
        Ok(())
    }

    fn execute(&mut self, action: &Action, state: StateId) -> Result<(), ActionError> {
        let scope = self.instance.scope_for(self.document, state);
        match action {
            Action::Assign { location, expr } => {
                if is_system_variable(location) {
                    return Err(ActionError::ReadOnly(location.clone()));
                }
                if !self.instance.contexts.has(scope, location) {
                    return Err(ActionError::UndefinedVariable(location.clone()));
                }
                let value = self.eval(scope, expr)?;
                self.instance.contexts.set(scope, location.clone(), value);
            }
            Action::Var { name, expr } => {
                if is_system_variable(name) {
                    return Err(ActionError::ReadOnly(name.clone()));
                }
                let value = match expr {
                    Some(expr) => self.eval(scope, expr)?,
                    None => Value::Null,
                };
                self.instance.contexts.set_local(scope, name.clone(), value);
            }
            Action::Log { label, expr } => {
                let value = expr.as_deref().map(|e| self.eval(scope, e)).transpose()?;
                tracing::info!(
                    target: LOG_ACTION_TARGET,
                    label = label.as_deref().unwrap_or(""),
                    state = self.document.id_of(state),
                    "{}",
                    value.as_ref().map(display_value).unwrap_or_default()
                );
            }
            Action::Raise { event } => {
                self.instance.raise(TriggerEvent::signal(event.clone()));
            }
            Action::Send(send) => self.send(send, scope)?,
            Action::Cancel { send_id } => self.env.dispatcher.cancel(send_id),
            Action::If { branches, otherwise } => {
                for branch in branches {
                    if self.eval_cond(scope, &branch.cond)? {
                        return self.execute_block(&branch.actions, state);
                    }
                }
                return self.execute_block(otherwise, state);
            }
        }
        Ok(())
    }

    fn eval(&self, scope: ScopeId, expr: &str) -> Result<Value, EvaluationError> {
        let context = self.instance.contexts.view(scope);
        self.env.evaluator.eval(&context, expr)
    }

    fn eval_cond(&self, scope: ScopeId, expr: &str) -> Result<bool, EvaluationError> {
        let context = self.instance.contexts.view(scope);
        self.env.evaluator.eval_cond(&context, expr)
    }

    fn param_value(&self, scope: ScopeId, param: &Param) -> Result<Value, EvaluationError> {
        match (&param.expr, &param.location) {
            (Some(expr), _) => self.eval(scope, expr),
            (None, Some(location)) => Ok(self
                .instance
                .contexts
                .get(scope, location)
                .cloned()
                .unwrap_or(Value::Null)),
            (None, None) => Ok(Value::Null),
        }
    }

    fn send(&mut self, send: &SendAction, scope: ScopeId) -> Result<(), ActionError> {
        let event = match (&send.event, &send.event_expr) {
            (Some(event), _) => event.clone(),
            (None, Some(expr)) => display_value(&self.eval(scope, expr)?),
            (None, None) => return Err(ActionError::MissingEvent),
        };

        let data = match &send.content_expr {
            Some(expr) => Some(self.eval(scope, expr)?),
            None => {
                let mut payload = Map::new();
                for name in &send.namelist {
                    match self.instance.contexts.get(scope, name) {
                        Some(value) => {
                            payload.insert(name.clone(), value.clone());
                        }
                        None => return Err(ActionError::UndefinedVariable(name.clone())),
                    }
                }
                for param in &send.params {
                    let value = self.param_value(scope, param)?;
                    payload.insert(param.name.clone(), value);
                }
                (!payload.is_empty()).then_some(Value::Object(payload))
            }
        };

        let send_id = match &send.id {
            Some(id) => id.clone(),
            None => self.instance.next_send_id(),
        };

        if send.target.as_deref() == Some(INTERNAL_TARGET) {
            let mut internal = TriggerEvent::signal(event).with_send_id(send_id);
            internal.data = data;
            self.instance.raise(internal);
            return Ok(());
        }

        let request = SendRequest {
            send_id,
            event,
            target: send.target.clone(),
            target_type: send.target_type.clone(),
            data,
            delay: send.delay.unwrap_or_default(),
            origin: self.instance.session_id().to_string(),
        };
        self.env.dispatcher.send(request)?;
        Ok(())
    }

    /// Evaluates the global datamodel and every state's datamodel in
    /// document order.
    pub(crate) fn initialize_datamodel(&mut self) {
        let document = self.document;
        let global = self.instance.global_scope();
        self.declare_all(document.datamodel(), global, None);

        for node in document.nodes().filter(|n| !n.is_pseudo()) {
            if node.datamodel().is_empty() {
                continue;
            }
            let scope = self.instance.scope_for(document, node.index());
            self.declare_all(node.datamodel(), scope, Some(node.id()));
        }
    }

    fn declare_all(&mut self, declarations: &[Data], scope: ScopeId, owner: Option<&str>) {
        for data in declarations {
            let value = match (&data.expr, &data.value) {
                (Some(expr), _) => match self.eval(scope, expr) {
                    Ok(value) => value,
                    Err(err) => {
                        self.env
                            .reporter
                            .on_error(ErrorKind::ExpressionError, &err.to_string(), owner);
                        self.instance.raise(TriggerEvent::error(ERROR_EXECUTION));
                        Value::Null
                    }
                },
                (None, Some(value)) => value.clone(),
                (None, None) => Value::Null,
            };
            self.instance.contexts.set_local(scope, data.id.clone(), value);
        }
    }

    /// Starts the invokes of states entered during the macrostep that are
    /// still active now that it has settled.
    pub(crate) fn initiate_invokes(&mut self) {
        let document = self.document;
        let pending = std::mem::take(&mut self.instance.pending_invokes);

        for state in pending {
            if !self.instance.configuration.is_active(state) {
                continue;
            }
            let node = document.node(state);
            let scope = self.instance.scope_for(document, state);
            for invoke in node.invokes() {
                let invoke_id = match &invoke.id {
                    Some(id) => id.clone(),
                    None => format!("{}.{}", node.id(), self.instance.next_sequence()),
                };

                let mut params = BTreeMap::new();
                for param in &invoke.params {
                    match self.param_value(scope, param) {
                        Ok(value) => {
                            params.insert(param.name.clone(), value);
                        }
                        Err(err) => {
                            self.env
                                .reporter
                                .on_error(ErrorKind::ExpressionError, &err.to_string(), Some(node.id()));
                        }
                    }
                }

                let request = InvokeRequest {
                    invoke_id: invoke_id.clone(),
                    state: node.id().to_string(),
                    kind: invoke.kind.clone(),
                    src: invoke.src.clone(),
                    params,
                };
                match self.env.invoker.start(request) {
                    Ok(()) => {
                        tracing::debug!(state = node.id(), invoke_id = %invoke_id, "started invoke");
                        self.instance
                            .active_invokes
                            .entry(state)
                            .or_default()
                            .push(invoke_id);
                    }
                    Err(err) => {
                        self.env
                            .reporter
                            .on_error(ErrorKind::InvokerError, &err.to_string(), Some(node.id()));
                        self.instance
                            .raise(TriggerEvent::error(ERROR_EXECUTION).with_invoke_id(invoke_id));
                    }
                }
            }
        }
    }

    /// Cancels the running invokes of an exited state.
    pub(crate) fn cancel_invokes(&mut self, state: StateId) {
        let Some(invoke_ids) = self.instance.active_invokes.remove(&state) else {
            return;
        };
        let document = self.document;
        for invoke_id in invoke_ids {
            if let Err(err) = self.env.invoker.cancel(&invoke_id) {
                self.env
                    .reporter
                    .on_error(ErrorKind::InvokerError, &err.to_string(), Some(document.id_of(state)));
                self.instance
                    .raise(TriggerEvent::error(ERROR_EXECUTION).with_invoke_id(invoke_id));
            }
        }
    }
}
