//! The executor running one statechart session.

use crate::checkpoint::{CheckpointError, Snapshot};
use crate::config::ExecutorConfig;
use crate::core::{Document, Status};
use crate::env::{Environment, ErrorKind};
use crate::event::{EventKind, TriggerEvent};
use crate::executor::error::ExecutorError;
use crate::executor::instance::Instance;
use crate::executor::queue::EventQueue;
use crate::logging;
use crate::semantics::{Semantics, Step, StepSummary};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Runs a [`Document`] against injected collaborators.
///
/// Each call to [`trigger_event`](Executor::trigger_event) performs one
/// macrostep: the event's microstep followed by eventless transitions and
/// internal events until the configuration is stable.
///
/// # Example
///
/// ```rust
/// use harel::builder::{DocumentBuilder, ExecutorBuilder, StateBuilder, TransitionBuilder};
/// use harel::env::MinimalEvaluator;
/// use harel::TriggerEvent;
/// use std::sync::Arc;
///
/// let document = DocumentBuilder::new()
///     .state(StateBuilder::new("Idle").transition(TransitionBuilder::on("start").to("Done")))
///     .state(StateBuilder::final_state("Done"))
///     .build()
///     .unwrap();
///
/// let mut executor = ExecutorBuilder::new(Arc::new(document))
///     .evaluator(MinimalEvaluator)
///     .build()
///     .unwrap();
///
/// executor.go().unwrap();
/// assert_eq!(executor.active_ids(), vec!["Idle"]);
///
/// executor.trigger_event(TriggerEvent::signal("start")).unwrap();
/// assert!(executor.status().is_final());
/// assert!(!executor.is_running());
/// ```
pub struct Executor {
    document: Arc<Document>,
    instance: Instance,
    env: Environment,
    config: ExecutorConfig,
    queue: EventQueue,
}

impl Executor {
    pub(crate) fn new(document: Arc<Document>, env: Environment, config: ExecutorConfig, queue: EventQueue) -> Self {
        Self {
            document,
            instance: Instance::new(),
            env,
            config,
            queue,
        }
    }

    fn semantics(&mut self) -> Semantics<'_> {
        Semantics::new(&self.document, &mut self.instance, &mut self.env, &self.config)
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Handle on the external queue drained by [`process_pending`](Executor::process_pending).
    pub fn event_queue(&self) -> EventQueue {
        self.queue.clone()
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn status(&self) -> &Status {
        self.instance.status()
    }

    pub fn is_running(&self) -> bool {
        self.instance.is_running()
    }

    pub fn session_id(&self) -> Uuid {
        self.instance.session_id()
    }

    /// Ids of all active states in document order.
    pub fn active_ids(&self) -> Vec<String> {
        self.document.ids_of(self.instance.status().all_states())
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.document
            .lookup(id)
            .map(|state| self.instance.status().is_active(state))
            .unwrap_or(false)
    }

    /// Reads a datamodel variable as seen from `state`, or from the global
    /// scope when `state` is `None`.
    pub fn value(&self, state: Option<&str>, name: &str) -> Option<&Value> {
        let scope = match state {
            Some(id) => self
                .instance
                .scope_for(&self.document, self.document.lookup(id)?),
            None => self.instance.global_scope(),
        };
        self.instance.contexts().get(scope, name)
    }

    /// Clears the session and initialises the datamodel without entering any state.
    pub fn reset(&mut self) {
        self.cancel_active_invokes();
        let single_context = self.env.evaluator.requires_global_context();
        self.instance.initialize(&self.document, single_context);
        self.semantics().initialize_datamodel();
        self.instance.refresh_status(&self.document);
        tracing::debug!(session = %self.instance.session_id(), "session reset");
    }

    /// Resets the session and enters the initial configuration.
    pub fn go(&mut self) -> Result<Vec<StepSummary>, ExecutorError> {
        self.reset();
        self.instance.start();
        tracing::info!(
            session = %self.instance.session_id(),
            document = self.document.name().unwrap_or(""),
            "session started"
        );

        let mut summaries = Vec::new();
        let result = self.enter_initial(&mut summaries);
        self.finish(result).map(|_| summaries)
    }

    fn enter_initial(&mut self, summaries: &mut Vec<StepSummary>) -> Result<(), ExecutorError> {
        let document = Arc::clone(&self.document);
        let step = self.semantics().initial_step()?;
        self.record(&document, &step, summaries);
        self.run_to_completion(summaries)
    }

    /// Processes one external event to completion.
    ///
    /// Ignored when the machine is not running; a [`EventKind::Cancel`] event
    /// stops it.
    pub fn trigger_event(&mut self, event: TriggerEvent) -> Result<Vec<StepSummary>, ExecutorError> {
        if !self.instance.is_running() {
            tracing::debug!(event = %event.name, "machine not running, event ignored");
            return Ok(Vec::new());
        }
        if event.kind == EventKind::Cancel {
            tracing::info!(session = %self.instance.session_id(), "session cancelled");
            self.stop();
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        let result = self.process_external(event, &mut summaries);
        self.finish(result)?;
        tracing::info!(
            session = %self.instance.session_id(),
            active = ?self.active_ids(),
            running = self.instance.is_running(),
            "macrostep complete"
        );
        Ok(summaries)
    }

    fn process_external(&mut self, event: TriggerEvent, summaries: &mut Vec<StepSummary>) -> Result<(), ExecutorError> {
        let document = Arc::clone(&self.document);
        let step = self.semantics().microstep(Some(event))?;
        self.record(&document, &step, summaries);
        self.run_to_completion(summaries)
    }

    /// Processes `events` in order, one macrostep each.
    pub fn trigger_events<I>(&mut self, events: I) -> Result<Vec<StepSummary>, ExecutorError>
    where
        I: IntoIterator<Item = TriggerEvent>,
    {
        let mut summaries = Vec::new();
        for event in events {
            summaries.extend(self.trigger_event(event)?);
        }
        Ok(summaries)
    }

    /// Drains the external queue while the machine keeps running.
    pub fn process_pending(&mut self) -> Result<Vec<StepSummary>, ExecutorError> {
        let mut summaries = Vec::new();
        while self.instance.is_running() {
            let Some(event) = self.queue.pop() else { break };
            summaries.extend(self.trigger_event(event)?);
        }
        Ok(summaries)
    }

    /// Stops the session, cancelling every running invoke.
    pub fn stop(&mut self) {
        self.cancel_active_invokes();
        self.instance.stop();
    }

    fn cancel_active_invokes(&mut self) {
        let states: Vec<_> = self.instance.active_invokes.keys().copied().collect();
        let mut semantics = self.semantics();
        for state in states {
            semantics.cancel_invokes(state);
        }
    }

    /// Runs eventless transitions and internal events until nothing is
    /// enabled, then starts pending invokes.
    fn run_to_completion(&mut self, summaries: &mut Vec<StepSummary>) -> Result<(), ExecutorError> {
        let document = Arc::clone(&self.document);
        let mut microsteps = 0usize;

        loop {
            while self.instance.is_running() {
                if microsteps >= self.config.max_microsteps {
                    let message = format!(
                        "macrostep exceeded {} microsteps, stopping",
                        self.config.max_microsteps
                    );
                    self.env.reporter.on_error(ErrorKind::LoopLimit, &message, None);
                    self.stop();
                    self.instance.sync_pending_events();
                    return Ok(());
                }

                let step = self.semantics().microstep(None)?;
                if step.has_transitions() {
                    microsteps += 1;
                    self.record(&document, &step, summaries);
                    continue;
                }

                let Some(event) = self.instance.next_internal() else {
                    break;
                };
                let step = self.semantics().microstep(Some(event))?;
                microsteps += 1;
                self.record(&document, &step, summaries);
            }

            if !self.instance.is_running() {
                break;
            }
            self.semantics().initiate_invokes();
            if self.instance.pending_internal_events() == 0 {
                break;
            }
        }

        self.instance.sync_pending_events();
        if self.instance.status().is_final() && self.instance.is_running() {
            tracing::info!(session = %self.instance.session_id(), "session reached a final state");
            self.stop();
        }
        Ok(())
    }

    fn record(&self, document: &Document, step: &Step, summaries: &mut Vec<StepSummary>) {
        if !step.has_transitions() && step.entry_list().is_empty() {
            return;
        }
        let summary = step.summary(document);
        logging::log_step(&self.instance.session_id().to_string(), &summary);
        summaries.push(summary);
    }

    fn finish(&mut self, result: Result<(), ExecutorError>) -> Result<(), ExecutorError> {
        if let Err(err) = &result {
            tracing::error!(session = %self.instance.session_id(), error = %err, "session stopped");
            self.stop();
        }
        result
    }

    /// Captures the session state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.document, &self.instance)
    }

    /// Replaces the session state with `snapshot`.
    ///
    /// The snapshot must come from a session of the same document. On error
    /// the session is left reset and stopped.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), CheckpointError> {
        self.cancel_active_invokes();
        let single_context = self.env.evaluator.requires_global_context();
        let result = snapshot.restore_into(&self.document, &mut self.instance, single_context);
        if result.is_err() {
            self.instance.initialize(&self.document, single_context);
        }
        result
    }
}
