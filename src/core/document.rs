//! The immutable statechart document and its tree queries.

use crate::core::node::{Data, NodeKind, StateId, StateNode};
use crate::core::path::Path;
use crate::core::transition::{Transition, TransitionId};
use crate::env::{ErrorKind, ErrorReporter};
use crate::legality::check_configuration;
use std::collections::{BTreeSet, HashMap};
use stillwater::validation::Validation;

/// A validated statechart.
///
/// Built once by the [`DocumentBuilder`](crate::builder::DocumentBuilder) and
/// then shared read-only (usually behind an `Arc`) by any number of executors.
/// All structural queries the interpreter needs live here.
///
/// # Example
///
/// ```rust
/// use harel::builder::{DocumentBuilder, StateBuilder};
///
/// let document = DocumentBuilder::new()
///     .state(
///         StateBuilder::new("A")
///             .state(StateBuilder::new("A1"))
///             .state(StateBuilder::new("A2")),
///     )
///     .build()
///     .unwrap();
///
/// let a = document.lookup("A").unwrap();
/// let a1 = document.lookup("A1").unwrap();
/// let a2 = document.lookup("A2").unwrap();
/// assert_eq!(document.lca(a1, a2), Some(a));
/// assert!(document.is_descendant(a1, a));
/// ```
#[derive(Debug)]
pub struct Document {
    pub(crate) name: Option<String>,
    pub(crate) datamodel_kind: Option<String>,
    pub(crate) nodes: Vec<StateNode>,
    pub(crate) transitions: Vec<Transition>,
    pub(crate) paths: Vec<Path>,
    pub(crate) ids: HashMap<String, StateId>,
    pub(crate) top_level: Vec<StateId>,
    pub(crate) initial: Vec<StateId>,
    pub(crate) datamodel: Vec<Data>,
}

impl Document {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: Option<String>,
        datamodel_kind: Option<String>,
        nodes: Vec<StateNode>,
        transitions: Vec<Transition>,
        ids: HashMap<String, StateId>,
        top_level: Vec<StateId>,
        initial: Vec<StateId>,
        datamodel: Vec<Data>,
    ) -> Self {
        let mut document = Self {
            name,
            datamodel_kind,
            nodes,
            transitions,
            paths: Vec::new(),
            ids,
            top_level,
            initial,
            datamodel,
        };
        let paths = document
            .transitions
            .iter()
            .map(|t| Path::compute(&document, t.source(), t.targets(), t.kind()))
            .collect();
        document.paths = paths;
        document
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Datamodel declared by the document, if any.
    pub fn datamodel_kind(&self) -> Option<&str> {
        self.datamodel_kind.as_deref()
    }

    /// Document-level (global) variable declarations.
    pub fn datamodel(&self) -> &[Data] {
        &self.datamodel
    }

    /// The node behind `id`.
    ///
    /// Ids are only produced by the document that owns them; passing an id
    /// from another document panics like an out-of-bounds slice index.
    pub fn node(&self, id: StateId) -> &StateNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &StateNode> {
        self.nodes.iter()
    }

    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.transitions[id.index()]
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }

    /// Precomputed path of a transition.
    pub fn path(&self, id: TransitionId) -> &Path {
        &self.paths[id.index()]
    }

    pub fn lookup(&self, id: &str) -> Option<StateId> {
        self.ids.get(id).copied()
    }

    pub fn id_of(&self, state: StateId) -> &str {
        self.node(state).id()
    }

    /// String ids of `states`, in iteration order.
    pub fn ids_of<'a, I>(&self, states: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a StateId>,
    {
        states
            .into_iter()
            .map(|s| self.id_of(*s).to_string())
            .collect()
    }

    pub fn top_level(&self) -> &[StateId] {
        &self.top_level
    }

    /// States entered when the machine starts.
    pub fn initial_targets(&self) -> &[StateId] {
        &self.initial
    }

    pub fn parent(&self, state: StateId) -> Option<StateId> {
        self.node(state).parent()
    }

    /// Proper ancestors of `state`, innermost first.
    pub fn ancestors(&self, state: StateId) -> Ancestors<'_> {
        Ancestors {
            document: self,
            next: self.parent(state),
        }
    }

    /// Whether `candidate` is a proper descendant of `ancestor`.
    pub fn is_descendant(&self, candidate: StateId, ancestor: StateId) -> bool {
        self.ancestors(candidate).any(|a| a == ancestor)
    }

    /// A region is a (non-pseudo) child of a parallel state.
    pub fn is_region(&self, state: StateId) -> bool {
        !self.node(state).is_pseudo()
            && self
                .parent(state)
                .map(|p| self.node(p).kind() == NodeKind::Parallel)
                .unwrap_or(false)
    }

    /// Least common ancestor of two states.
    ///
    /// If one state is an ancestor of the other, the ancestor is returned; a
    /// state is its own LCA. Two states in different top-level subtrees have
    /// no common ancestor.
    pub fn lca(&self, a: StateId, b: StateId) -> Option<StateId> {
        if a == b || self.is_descendant(b, a) {
            return Some(a);
        }
        if self.is_descendant(a, b) {
            return Some(b);
        }
        let above_a: BTreeSet<StateId> = self.ancestors(a).collect();
        self.ancestors(b).find(|s| above_a.contains(s))
    }

    /// `states` together with all of their ancestors.
    ///
    /// Walking upward stops at any node in `upper_bounds`, which is not added.
    pub fn ancestor_closure<'a, I>(&self, states: I, upper_bounds: &BTreeSet<StateId>) -> BTreeSet<StateId>
    where
        I: IntoIterator<Item = &'a StateId>,
    {
        let mut closure = BTreeSet::new();
        for &state in states {
            closure.insert(state);
            for ancestor in self.ancestors(state) {
                if upper_bounds.contains(&ancestor) || !closure.insert(ancestor) {
                    break;
                }
            }
        }
        closure
    }

    /// Deepest states first, reverse document order among equals.
    pub fn sort_exit_order(&self, states: &mut [StateId]) {
        states.sort_by(|a, b| {
            self.node(*b)
                .depth()
                .cmp(&self.node(*a).depth())
                .then_with(|| b.cmp(a))
        });
    }

    /// Shallowest states first, document order among equals.
    pub fn sort_entry_order(&self, states: &mut [StateId]) {
        states.sort_by(|a, b| {
            self.node(*a)
                .depth()
                .cmp(&self.node(*b).depth())
                .then_with(|| a.cmp(b))
        });
    }

    /// Checks the legality rules on a set of atomic states, reporting each
    /// violation as [`ErrorKind::IllegalConfig`].
    pub fn is_legal_configuration(&self, states: &BTreeSet<StateId>, reporter: &dyn ErrorReporter) -> bool {
        match check_configuration(self, states) {
            Validation::Success(()) => true,
            Validation::Failure(violations) => {
                for violation in violations.iter() {
                    reporter.on_error(ErrorKind::IllegalConfig, &violation.to_string(), violation.state());
                }
                false
            }
        }
    }
}

/// Iterator over the proper ancestors of a state.
pub struct Ancestors<'a> {
    document: &'a Document,
    next: Option<StateId>,
}

impl Iterator for Ancestors<'_> {
    type Item = StateId;

    fn next(&mut self) -> Option<StateId> {
        let current = self.next?;
        self.next = self.document.parent(current);
        Some(current)
    }
}
