//! Builder for statechart documents.

use crate::builder::error::{BuildError, ModelError};
use crate::builder::state::{StateBuilder, StateShape};
use crate::builder::transition::TransitionBuilder;
use crate::builder::validate::validate_document;
use crate::core::transition::parse_descriptors;
use crate::core::{Action, Data, Document, NodeKind, StateId, StateNode, Transition, TransitionId, TransitionKind};
use std::collections::HashMap;
use stillwater::validation::Validation;

/// Builder for [`Document`]s.
///
/// Lowers the nested state builders into the document's arena, resolves
/// target ids and then validates the result, reporting every problem at once.
///
/// # Example
///
/// ```rust
/// use harel::builder::{DocumentBuilder, StateBuilder, TransitionBuilder};
///
/// let document = DocumentBuilder::new()
///     .name("light")
///     .state(StateBuilder::new("Off").transition(TransitionBuilder::on("toggle").to("On")))
///     .state(StateBuilder::new("On").transition(TransitionBuilder::on("toggle").to("Off")))
///     .build()
///     .unwrap();
///
/// assert_eq!(document.name(), Some("light"));
/// assert_eq!(document.initial_targets(), &[document.lookup("Off").unwrap()]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DocumentBuilder {
    name: Option<String>,
    datamodel_kind: Option<String>,
    initial: Vec<String>,
    states: Vec<StateBuilder>,
    datamodel: Vec<Data>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Datamodel the document is written for; checked against the evaluator.
    pub fn datamodel_kind(mut self, kind: impl Into<String>) -> Self {
        self.datamodel_kind = Some(kind.into());
        self
    }

    /// Space separated ids of the states entered on start. Defaults to the
    /// first top-level state.
    pub fn initial(mut self, targets: &str) -> Self {
        self.initial.extend(parse_descriptors(targets));
        self
    }

    pub fn state(mut self, state: StateBuilder) -> Self {
        self.states.push(state);
        self
    }

    pub fn states(mut self, states: impl IntoIterator<Item = StateBuilder>) -> Self {
        self.states.extend(states);
        self
    }

    /// A global datamodel variable.
    pub fn data(mut self, data: Data) -> Self {
        self.datamodel.push(data);
        self
    }

    pub fn build(self) -> Result<Document, BuildError> {
        if self.states.is_empty() {
            return Err(BuildError::NoStates);
        }

        let mut lowering = Lowering::default();
        let top_level: Vec<StateId> = self
            .states
            .into_iter()
            .map(|state| lowering.lower(state, None, 0))
            .collect();

        let initial_refs = if self.initial.is_empty() {
            vec![TargetRef::Node(top_level[0])]
        } else {
            self.initial.into_iter().map(TargetRef::Id).collect()
        };

        let lowered = lowering.finish(initial_refs);
        if !lowered.errors.is_empty() {
            return Err(BuildError::Invalid(lowered.errors));
        }

        let document = Document::new(
            self.name,
            self.datamodel_kind,
            lowered.nodes,
            lowered.transitions,
            lowered.ids,
            top_level,
            lowered.initial,
            self.datamodel,
        );

        match validate_document(&document) {
            Validation::Success(()) => Ok(document),
            Validation::Failure(errors) => Err(BuildError::Invalid(errors.iter().cloned().collect())),
        }
    }
}

#[derive(Clone, Debug)]
enum TargetRef {
    Id(String),
    Node(StateId),
}

struct PendingTransition {
    source: StateId,
    events: Vec<String>,
    cond: Option<String>,
    targets: Vec<TargetRef>,
    kind: TransitionKind,
    actions: Vec<Action>,
}

impl PendingTransition {
    fn new(source: StateId, builder: TransitionBuilder) -> Self {
        Self {
            source,
            events: builder.events,
            cond: builder.cond,
            targets: builder.targets.into_iter().map(TargetRef::Id).collect(),
            kind: builder.kind,
            actions: builder.actions,
        }
    }

    fn default_transition(source: StateId, targets: Vec<TargetRef>, actions: Vec<Action>) -> Self {
        Self {
            source,
            events: Vec::new(),
            cond: None,
            targets,
            kind: TransitionKind::External,
            actions,
        }
    }
}

struct Lowered {
    nodes: Vec<StateNode>,
    transitions: Vec<Transition>,
    ids: HashMap<String, StateId>,
    initial: Vec<StateId>,
    errors: Vec<ModelError>,
}

#[derive(Default)]
struct Lowering {
    nodes: Vec<StateNode>,
    ids: HashMap<String, StateId>,
    pending: Vec<PendingTransition>,
    errors: Vec<ModelError>,
}

impl Lowering {
    fn allocate(&mut self, id: Option<String>, kind: NodeKind, parent: Option<StateId>, depth: usize) -> StateId {
        let index = StateId(self.nodes.len() as u32);
        let id = id.unwrap_or_else(|| format!("_generated_id_{}", index.0));
        if self.ids.contains_key(&id) {
            self.errors.push(ModelError::DuplicateId(id.clone()));
        } else {
            self.ids.insert(id.clone(), index);
        }
        self.nodes.push(StateNode::new(id, index, kind, parent, depth));
        index
    }

    /// Lowers `builder` and its subtree; states get ids in pre-order and the
    /// pseudo-states of a state follow its children.
    fn lower(&mut self, builder: StateBuilder, parent: Option<StateId>, depth: usize) -> StateId {
        let kind = match builder.shape {
            StateShape::Parallel => NodeKind::Parallel,
            StateShape::Final => NodeKind::Final,
            StateShape::State if builder.children.is_empty() => NodeKind::Simple,
            StateShape::State => NodeKind::Composite,
        };
        let index = self.allocate(builder.id, kind, parent, depth);
        let state_id = self.nodes[index.index()].id.clone();

        if kind == NodeKind::Final && !builder.children.is_empty() {
            self.errors.push(ModelError::FinalWithChildren(state_id.clone()));
        }
        if kind == NodeKind::Parallel && builder.children.is_empty() {
            self.errors.push(ModelError::EmptyParallel(state_id.clone()));
        }

        for transition in builder.transitions {
            self.pending.push(PendingTransition::new(index, transition));
        }

        {
            let node = &mut self.nodes[index.index()];
            node.on_entry = builder.on_entry;
            node.on_exit = builder.on_exit;
            node.datamodel = builder.datamodel;
            node.invokes = builder.invokes;
        }

        let children: Vec<StateId> = if kind == NodeKind::Final {
            Vec::new()
        } else {
            builder
                .children
                .into_iter()
                .map(|child| self.lower(child, Some(index), depth + 1))
                .collect()
        };
        self.nodes[index.index()].children = children.clone();

        let mut default_targets: Vec<TargetRef> = children.iter().copied().map(TargetRef::Node).collect();
        if kind == NodeKind::Composite {
            let initial = builder.initial.unwrap_or_default();
            let targets = if initial.targets.is_empty() {
                vec![TargetRef::Node(children[0])]
            } else {
                initial.targets.into_iter().map(TargetRef::Id).collect()
            };
            default_targets = targets.clone();

            let pseudo = self.allocate(None, NodeKind::Initial, Some(index), depth + 1);
            self.pending
                .push(PendingTransition::default_transition(pseudo, targets, initial.actions));
            self.nodes[index.index()].initial = Some(pseudo);
        } else if builder.initial.is_some() {
            self.errors.push(ModelError::InitialOnNonCompound(state_id.clone()));
        }

        for history in builder.histories {
            let pseudo = self.allocate(history.id, NodeKind::History(history.depth), Some(index), depth + 1);
            if kind.is_atomic() {
                self.errors.push(ModelError::HistoryOnAtomicState {
                    history: self.nodes[pseudo.index()].id.clone(),
                    state: state_id.clone(),
                });
            }
            let default = history.default.unwrap_or_default();
            let targets = if default.targets.is_empty() {
                default_targets.clone()
            } else {
                default.targets.into_iter().map(TargetRef::Id).collect()
            };
            self.pending
                .push(PendingTransition::default_transition(pseudo, targets, default.actions));
            self.nodes[index.index()].histories.push(pseudo);
        }

        index
    }

    fn resolve(&mut self, owner: &str, targets: Vec<TargetRef>) -> Vec<StateId> {
        let mut resolved = Vec::with_capacity(targets.len());
        for target in targets {
            match target {
                TargetRef::Node(id) => resolved.push(id),
                TargetRef::Id(name) => match self.ids.get(&name) {
                    Some(id) => resolved.push(*id),
                    None => self.errors.push(ModelError::UnresolvedTarget {
                        state: owner.to_string(),
                        target: name,
                    }),
                },
            }
        }
        resolved
    }

    fn finish(mut self, initial: Vec<TargetRef>) -> Lowered {
        let pending = std::mem::take(&mut self.pending);
        let mut transitions = Vec::with_capacity(pending.len());

        for (position, transition) in pending.into_iter().enumerate() {
            let index = TransitionId(position as u32);
            let owner = self.nodes[transition.source.index()].id.clone();
            let targets = self.resolve(&owner, transition.targets);
            self.nodes[transition.source.index()].transitions.push(index);
            transitions.push(Transition {
                index,
                source: transition.source,
                events: transition.events,
                cond: transition.cond,
                targets,
                kind: transition.kind,
                actions: transition.actions,
            });
        }

        let initial = self.resolve("<document>", initial);

        Lowered {
            nodes: self.nodes,
            transitions,
            ids: self.ids,
            initial,
            errors: self.errors,
        }
    }
}
