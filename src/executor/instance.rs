//! Runtime state of one statechart session.

use crate::core::{Document, HistoryStore, StateConfiguration, StateId, Status};
use crate::env::context::{ALL_STATES_KEY, EVENT_KEY, NAME_KEY, SESSION_ID_KEY};
use crate::env::{ContextStore, ScopeId};
use crate::event::TriggerEvent;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use uuid::Uuid;

/// Everything that changes while a session runs.
///
/// The [`Document`] is shared and immutable; all per-session bookkeeping
/// (configuration, histories, datamodel scopes, queues, invokes) lives here.
#[derive(Clone, Debug)]
pub struct Instance {
    pub(crate) configuration: StateConfiguration,
    pub(crate) status: Status,
    pub(crate) contexts: ContextStore,
    pub(crate) system_scope: ScopeId,
    pub(crate) global_scope: ScopeId,
    pub(crate) scopes: HashMap<StateId, ScopeId>,
    pub(crate) histories: HistoryStore,
    pub(crate) completed: BTreeSet<StateId>,
    pub(crate) active_invokes: BTreeMap<StateId, Vec<String>>,
    pub(crate) pending_invokes: BTreeSet<StateId>,
    pub(crate) internal_queue: VecDeque<TriggerEvent>,
    pub(crate) running: bool,
    pub(crate) session_id: Uuid,
    pub(crate) sequence: u64,
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

impl Instance {
    pub fn new() -> Self {
        let mut contexts = ContextStore::new();
        let system_scope = contexts.create(None);
        let global_scope = contexts.create(Some(system_scope));
        Self {
            configuration: StateConfiguration::new(),
            status: Status::default(),
            contexts,
            system_scope,
            global_scope,
            scopes: HashMap::new(),
            histories: HistoryStore::new(),
            completed: BTreeSet::new(),
            active_invokes: BTreeMap::new(),
            pending_invokes: BTreeSet::new(),
            internal_queue: VecDeque::new(),
            running: false,
            session_id: Uuid::new_v4(),
            sequence: 0,
        }
    }

    /// Clears all session state and lays out fresh scopes for `document`.
    ///
    /// With `single_context` every state shares the global scope. The
    /// datamodel itself is not evaluated here.
    pub(crate) fn initialize(&mut self, document: &Document, single_context: bool) {
        self.configuration.clear();
        self.status = Status::default();
        self.histories.clear();
        self.completed.clear();
        self.active_invokes.clear();
        self.pending_invokes.clear();
        self.internal_queue.clear();
        self.running = false;
        self.sequence = 0;

        self.contexts.clear();
        self.system_scope = self.contexts.create(None);
        self.global_scope = self.contexts.create(Some(self.system_scope));
        self.scopes.clear();

        if !single_context {
            for node in document.nodes().filter(|n| !n.is_pseudo()) {
                let parent_scope = node
                    .parent()
                    .and_then(|p| self.scopes.get(&p).copied())
                    .unwrap_or(self.global_scope);
                let scope = self.contexts.create(Some(parent_scope));
                self.scopes.insert(node.index(), scope);
            }
        }

        self.contexts
            .set_local(self.system_scope, SESSION_ID_KEY, Value::String(self.session_id.to_string()));
        let name = document.name().map(|n| Value::String(n.to_string())).unwrap_or(Value::Null);
        self.contexts.set_local(self.system_scope, NAME_KEY, name);
        self.contexts
            .set_local(self.system_scope, ALL_STATES_KEY, Value::Array(Vec::new()));
    }

    /// Scope in which the executable content of `state` runs.
    ///
    /// Pseudo-states use their parent's scope.
    pub fn scope_for(&self, document: &Document, state: StateId) -> ScopeId {
        let mut cursor = Some(state);
        while let Some(current) = cursor {
            if let Some(scope) = self.scopes.get(&current) {
                return *scope;
            }
            cursor = document.parent(current);
        }
        self.global_scope
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global_scope
    }

    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    pub fn configuration(&self) -> &StateConfiguration {
        &self.configuration
    }

    pub fn histories(&self) -> &HistoryStore {
        &self.histories
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Compound and parallel states whose completion has been signalled.
    pub fn completed(&self) -> &BTreeSet<StateId> {
        &self.completed
    }

    pub fn pending_internal_events(&self) -> usize {
        self.internal_queue.len()
    }

    pub(crate) fn start(&mut self) {
        self.running = true;
    }

    pub(crate) fn stop(&mut self) {
        self.running = false;
    }

    pub(crate) fn raise(&mut self, event: TriggerEvent) {
        tracing::trace!(event = %event.name, "raised internal event");
        self.internal_queue.push_back(event);
    }

    pub(crate) fn next_internal(&mut self) -> Option<TriggerEvent> {
        self.internal_queue.pop_front()
    }

    /// Binds `_event`; `None` clears it for the eventless step.
    pub(crate) fn set_current_event(&mut self, event: Option<&TriggerEvent>) {
        match event {
            Some(event) => self.contexts.set_local(self.system_scope, EVENT_KEY, event.to_value()),
            None => {
                self.contexts.remove_local(self.system_scope, EVENT_KEY);
            }
        }
    }

    /// Re-captures the status and republishes `_ALL_STATES`.
    pub(crate) fn refresh_status(&mut self, document: &Document) {
        self.status = Status::capture(document, &self.configuration, self.internal_queue.len());
        let active = self
            .status
            .all_states()
            .iter()
            .map(|s| Value::String(document.id_of(*s).to_string()))
            .collect();
        self.contexts
            .set_local(self.system_scope, ALL_STATES_KEY, Value::Array(active));
    }

    pub(crate) fn sync_pending_events(&mut self) {
        let pending = self.internal_queue.len();
        self.status = std::mem::take(&mut self.status).with_pending_events(pending);
    }

    /// Next value of the per-session sequence.
    pub(crate) fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    /// Generated id for a send without an explicit one.
    pub(crate) fn next_send_id(&mut self) -> String {
        let sequence = self.next_sequence();
        format!("{}-{}", self.session_id, sequence)
    }
}
