//! History pseudo-state bookkeeping.
//!
//! When a state with history children is exited, each history records the part
//! of the configuration it is responsible for. Entering the history later
//! restores that configuration instead of the default transition.

use crate::core::document::Document;
use crate::core::node::{HistoryDepth, StateId};
use crate::core::status::Status;
use std::collections::{BTreeMap, BTreeSet};

/// Last recorded configuration per history pseudo-state.
///
/// # Example
///
/// ```rust
/// use harel::builder::{DocumentBuilder, HistoryBuilder, StateBuilder};
/// use harel::core::HistoryStore;
///
/// let document = DocumentBuilder::new()
///     .state(
///         StateBuilder::new("B")
///             .history(HistoryBuilder::shallow("H"))
///             .state(StateBuilder::new("B1"))
///             .state(StateBuilder::new("B2")),
///     )
///     .build()
///     .unwrap();
///
/// let h = document.lookup("H").unwrap();
/// let b2 = document.lookup("B2").unwrap();
///
/// let mut store = HistoryStore::new();
/// assert!(store.is_empty(h));
///
/// store.record(h, [b2].into_iter().collect());
/// assert!(store.last_configuration(h).unwrap().contains(&b2));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryStore {
    configurations: BTreeMap<StateId, BTreeSet<StateId>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever `history` remembered before.
    pub fn record(&mut self, history: StateId, states: BTreeSet<StateId>) {
        self.configurations.insert(history, states);
    }

    pub fn last_configuration(&self, history: StateId) -> Option<&BTreeSet<StateId>> {
        self.configurations.get(&history)
    }

    pub fn is_empty(&self, history: StateId) -> bool {
        self.configurations
            .get(&history)
            .map(BTreeSet::is_empty)
            .unwrap_or(true)
    }

    pub fn reset(&mut self, history: StateId) {
        self.configurations.remove(&history);
    }

    pub fn clear(&mut self) {
        self.configurations.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateId, &BTreeSet<StateId>)> {
        self.configurations.iter()
    }

    /// Records every history of `exited`, reading the configuration that was
    /// active before the step.
    ///
    /// Deep histories keep the atomic descendants of `exited`; shallow ones
    /// keep its active children.
    pub fn record_exit(&mut self, document: &Document, exited: StateId, before: &Status) {
        let node = document.node(exited);
        for &history in node.histories() {
            let Some(depth) = document.node(history).kind().history_depth() else {
                continue;
            };
            let remembered: BTreeSet<StateId> = match depth {
                HistoryDepth::Deep => before
                    .states()
                    .iter()
                    .copied()
                    .filter(|s| document.is_descendant(*s, exited))
                    .collect(),
                HistoryDepth::Shallow => node
                    .children()
                    .iter()
                    .copied()
                    .filter(|c| before.is_active(*c))
                    .collect(),
            };
            tracing::trace!(
                history = document.id_of(history),
                states = ?document.ids_of(&remembered),
                "recorded history"
            );
            self.record(history, remembered);
        }
    }
}
