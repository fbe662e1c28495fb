//! Static statechart nodes.
//!
//! Every state and pseudo-state of a document lives in a flat arena and is
//! addressed by a [`StateId`]. Ids are handed out in document (pre-order)
//! order, so comparing two ids compares their document positions.

use crate::core::action::{Action, Param};
use crate::core::transition::TransitionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Arena index of a node inside a [`Document`](crate::core::Document).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(pub(crate) u32);

impl StateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Depth of a history pseudo-state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryDepth {
    /// Remembers the direct children that were active.
    Shallow,
    /// Remembers the active atomic descendants.
    Deep,
}

/// Kind of a statechart node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A state without children.
    Simple,
    /// A state with children, exactly one of which is active at a time.
    Composite,
    /// A state whose children (regions) are all active at once.
    Parallel,
    /// An atomic state that signals completion of its parent.
    Final,
    /// Pseudo-state holding the default transition of a compound state.
    Initial,
    /// Pseudo-state restoring a previously active configuration.
    History(HistoryDepth),
}

impl NodeKind {
    /// Pseudo-states are never part of an active configuration.
    pub fn is_pseudo(self) -> bool {
        matches!(self, Self::Initial | Self::History(_))
    }

    pub fn is_atomic(self) -> bool {
        matches!(self, Self::Simple | Self::Final)
    }

    pub fn is_compound(self) -> bool {
        matches!(self, Self::Composite)
    }

    pub fn is_parallel(self) -> bool {
        matches!(self, Self::Parallel)
    }

    pub fn is_final(self) -> bool {
        matches!(self, Self::Final)
    }

    pub fn history_depth(self) -> Option<HistoryDepth> {
        match self {
            Self::History(depth) => Some(depth),
            _ => None,
        }
    }
}

/// A datamodel variable declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Data {
    pub id: String,
    /// Expression evaluated when the variable is initialised.
    pub expr: Option<String>,
    /// Literal value, used when no expression is given.
    pub value: Option<Value>,
}

impl Data {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            expr: None,
            value: None,
        }
    }

    pub fn expr(id: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            expr: Some(expr.into()),
            value: None,
        }
    }

    pub fn value(id: impl Into<String>, value: Value) -> Self {
        Self {
            id: id.into(),
            expr: None,
            value: Some(value),
        }
    }
}

/// Declaration of an external service started while a state is active.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Invoke {
    pub id: Option<String>,
    /// Service type understood by the [`InvokerManager`](crate::env::InvokerManager).
    pub kind: String,
    pub src: Option<String>,
    pub params: Vec<Param>,
}

impl Invoke {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }
}

/// A node of the statechart tree.
///
/// Nodes are created by the [`DocumentBuilder`](crate::builder::DocumentBuilder)
/// and never change afterwards.
#[derive(Clone, Debug)]
pub struct StateNode {
    pub(crate) id: String,
    pub(crate) index: StateId,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<StateId>,
    pub(crate) depth: usize,
    pub(crate) children: Vec<StateId>,
    pub(crate) initial: Option<StateId>,
    pub(crate) histories: Vec<StateId>,
    pub(crate) transitions: Vec<TransitionId>,
    pub(crate) on_entry: Vec<Action>,
    pub(crate) on_exit: Vec<Action>,
    pub(crate) datamodel: Vec<Data>,
    pub(crate) invokes: Vec<Invoke>,
}

impl StateNode {
    pub(crate) fn new(
        id: String,
        index: StateId,
        kind: NodeKind,
        parent: Option<StateId>,
        depth: usize,
    ) -> Self {
        Self {
            id,
            index,
            kind,
            parent,
            depth,
            children: Vec::new(),
            initial: None,
            histories: Vec::new(),
            transitions: Vec::new(),
            on_entry: Vec::new(),
            on_exit: Vec::new(),
            datamodel: Vec::new(),
            invokes: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> StateId {
        self.index
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    /// Number of proper ancestors; top-level states have depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Child states in document order. Pseudo-states are not included.
    pub fn children(&self) -> &[StateId] {
        &self.children
    }

    /// The initial pseudo-state of a compound state.
    pub fn initial(&self) -> Option<StateId> {
        self.initial
    }

    pub fn histories(&self) -> &[StateId] {
        &self.histories
    }

    /// Outgoing transitions in document order.
    ///
    /// For an initial pseudo-state this is its single default transition; for a
    /// history pseudo-state the first entry is the default history transition.
    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    pub fn on_entry(&self) -> &[Action] {
        &self.on_entry
    }

    pub fn on_exit(&self) -> &[Action] {
        &self.on_exit
    }

    pub fn datamodel(&self) -> &[Data] {
        &self.datamodel
    }

    pub fn invokes(&self) -> &[Invoke] {
        &self.invokes
    }

    pub fn is_atomic(&self) -> bool {
        self.kind.is_atomic()
    }

    pub fn is_pseudo(&self) -> bool {
        self.kind.is_pseudo()
    }
}
