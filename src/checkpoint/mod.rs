//! Checkpoint and resume functionality for statechart sessions.
//!
//! A [`Snapshot`] captures everything that changes while a session runs
//! (active states, histories, datamodel, queued internal events) by state id,
//! so it can be written to disk and restored into a fresh executor built from
//! the same document.

use crate::core::{Document, StateId};
use crate::event::TriggerEvent;
use crate::executor::Instance;
use crate::legality::check_configuration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use stillwater::validation::Validation;
use uuid::Uuid;

pub mod error;
pub mod value;

pub use error::CheckpointError;
pub use value::StoredValue;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable state of a session.
/// Does NOT include the document or the collaborators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Name of the document the session runs
    pub document: Option<String>,

    pub session_id: String,

    pub running: bool,

    /// All active state ids, in document order
    pub active: Vec<String>,

    /// Recorded configuration per history id
    pub histories: BTreeMap<String, Vec<String>>,

    /// States whose completion has been signalled
    pub completed: Vec<String>,

    /// Running invoke ids per state
    pub invokes: BTreeMap<String, Vec<String>>,

    /// States whose invokes have not been started yet
    pub pending_invokes: Vec<String>,

    /// Global datamodel
    pub global: BTreeMap<String, StoredValue>,

    /// Per-state datamodel, only for states that declared something
    pub contexts: BTreeMap<String, BTreeMap<String, StoredValue>>,

    /// Internal events not processed yet
    pub internal_events: Vec<TriggerEvent>,

    pub sequence: u64,
}

fn stored(vars: &BTreeMap<String, serde_json::Value>) -> BTreeMap<String, StoredValue> {
    vars.iter()
        .map(|(name, value)| (name.clone(), StoredValue(value.clone())))
        .collect()
}

impl Snapshot {
    /// Captures the state of `instance`.
    pub fn capture(document: &Document, instance: &Instance) -> Self {
        let ids = |states: &BTreeSet<StateId>| document.ids_of(states);

        let histories = instance
            .histories()
            .iter()
            .map(|(history, states)| (document.id_of(*history).to_string(), ids(states)))
            .collect();

        let invokes = instance
            .active_invokes
            .iter()
            .map(|(state, invoke_ids)| (document.id_of(*state).to_string(), invoke_ids.clone()))
            .collect();

        let contexts = instance
            .scopes
            .iter()
            .filter(|(_, scope)| !instance.contexts().vars(**scope).is_empty())
            .map(|(state, scope)| {
                (
                    document.id_of(*state).to_string(),
                    stored(instance.contexts().vars(*scope)),
                )
            })
            .collect();

        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            document: document.name().map(str::to_string),
            session_id: instance.session_id().to_string(),
            running: instance.is_running(),
            active: ids(instance.configuration().active_states()),
            histories,
            completed: ids(instance.completed()),
            invokes,
            pending_invokes: ids(&instance.pending_invokes),
            global: stored(instance.contexts().vars(instance.global_scope())),
            contexts,
            internal_events: instance.internal_queue.iter().cloned().collect(),
            sequence: instance.sequence,
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        snapshot.validate_version()?;
        Ok(snapshot)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let snapshot: Self =
            bincode::deserialize(bytes).map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        snapshot.validate_version()?;
        Ok(snapshot)
    }

    pub fn validate_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }

    fn resolve(document: &Document, id: &str) -> Result<StateId, CheckpointError> {
        document
            .lookup(id)
            .ok_or_else(|| CheckpointError::UnknownState(id.to_string()))
    }

    fn resolve_all(document: &Document, ids: &[String]) -> Result<Vec<StateId>, CheckpointError> {
        ids.iter().map(|id| Self::resolve(document, id)).collect()
    }

    /// Validates the snapshot against `document` and loads it into `instance`.
    ///
    /// Nothing is written to `instance` unless every id resolves and the
    /// active set is a legal, ancestor-closed configuration.
    pub(crate) fn restore_into(
        &self,
        document: &Document,
        instance: &mut Instance,
        single_context: bool,
    ) -> Result<(), CheckpointError> {
        self.validate_version()?;

        let mut active = Self::resolve_all(document, &self.active)?;
        if let Some(pseudo) = active.iter().find(|s| document.node(**s).is_pseudo()) {
            return Err(CheckpointError::ValidationFailed(format!(
                "pseudo-state '{}' cannot be active",
                document.id_of(*pseudo)
            )));
        }
        document.sort_entry_order(&mut active);

        let active_set: BTreeSet<StateId> = active.iter().copied().collect();
        let atomic: BTreeSet<StateId> = active
            .iter()
            .copied()
            .filter(|s| document.node(*s).is_atomic())
            .collect();
        if document.ancestor_closure(&atomic, &BTreeSet::new()) != active_set {
            return Err(CheckpointError::ValidationFailed(
                "active states are not the ancestor closure of the active atomic states".to_string(),
            ));
        }
        if let Validation::Failure(violations) = check_configuration(document, &atomic) {
            let message = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CheckpointError::ValidationFailed(message));
        }

        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| CheckpointError::ValidationFailed(format!("invalid session id: {e}")))?;

        let mut histories = Vec::with_capacity(self.histories.len());
        for (history, states) in &self.histories {
            let history = Self::resolve(document, history)?;
            let states: BTreeSet<StateId> = Self::resolve_all(document, states)?.into_iter().collect();
            histories.push((history, states));
        }
        let completed = Self::resolve_all(document, &self.completed)?;
        let pending_invokes = Self::resolve_all(document, &self.pending_invokes)?;
        let mut invokes = BTreeMap::new();
        for (state, invoke_ids) in &self.invokes {
            invokes.insert(Self::resolve(document, state)?, invoke_ids.clone());
        }
        let mut contexts = Vec::with_capacity(self.contexts.len());
        for (state, vars) in &self.contexts {
            contexts.push((Self::resolve(document, state)?, vars));
        }

        instance.session_id = session_id;
        instance.initialize(document, single_context);

        for state in active {
            instance
                .configuration
                .enter_state(document.node(state))
                .map_err(|e| CheckpointError::ValidationFailed(e.to_string()))?;
        }
        for (history, states) in histories {
            instance.histories.record(history, states);
        }
        instance.completed.extend(completed);
        instance.pending_invokes.extend(pending_invokes);
        instance.active_invokes = invokes;

        let global = instance.global_scope();
        for (name, value) in &self.global {
            instance.contexts.set_local(global, name.clone(), value.0.clone());
        }
        for (state, vars) in contexts {
            let scope = instance.scope_for(document, state);
            for (name, value) in vars {
                instance.contexts.set_local(scope, name.clone(), value.0.clone());
            }
        }

        instance.internal_queue.extend(self.internal_events.iter().cloned());
        instance.sequence = self.sequence;
        instance.running = self.running;
        instance.refresh_status(document);
        Ok(())
    }
}
