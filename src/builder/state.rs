//! Builders for states and history pseudo-states.

use crate::builder::transition::TransitionBuilder;
use crate::core::{Action, Data, HistoryDepth, Invoke};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StateShape {
    State,
    Parallel,
    Final,
}

/// Fluent description of a state and its subtree.
///
/// A plain state becomes compound as soon as it has children. Without an
/// explicit [`initial`](StateBuilder::initial) a compound state starts in its
/// first child.
///
/// # Example
///
/// ```rust
/// use harel::builder::{HistoryBuilder, StateBuilder, TransitionBuilder};
///
/// let editor = StateBuilder::new("Editor")
///     .initial("Clean")
///     .history(HistoryBuilder::shallow("EditorHistory"))
///     .state(StateBuilder::new("Clean").transition(TransitionBuilder::on("edit").to("Dirty")))
///     .state(StateBuilder::new("Dirty").transition(TransitionBuilder::on("save").to("Clean")));
/// ```
#[derive(Clone, Debug)]
pub struct StateBuilder {
    pub(crate) id: Option<String>,
    pub(crate) shape: StateShape,
    pub(crate) children: Vec<StateBuilder>,
    pub(crate) initial: Option<TransitionBuilder>,
    pub(crate) histories: Vec<HistoryBuilder>,
    pub(crate) transitions: Vec<TransitionBuilder>,
    pub(crate) on_entry: Vec<Action>,
    pub(crate) on_exit: Vec<Action>,
    pub(crate) datamodel: Vec<Data>,
    pub(crate) invokes: Vec<Invoke>,
}

impl StateBuilder {
    fn with_shape(id: Option<String>, shape: StateShape) -> Self {
        Self {
            id,
            shape,
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

    pub fn new(id: impl Into<String>) -> Self {
        Self::with_shape(Some(id.into()), StateShape::State)
    }

    /// A state whose id is generated when the document is built.
    pub fn anonymous() -> Self {
        Self::with_shape(None, StateShape::State)
    }

    pub fn parallel(id: impl Into<String>) -> Self {
        Self::with_shape(Some(id.into()), StateShape::Parallel)
    }

    pub fn final_state(id: impl Into<String>) -> Self {
        Self::with_shape(Some(id.into()), StateShape::Final)
    }

    pub fn state(mut self, child: StateBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn states(mut self, children: impl IntoIterator<Item = StateBuilder>) -> Self {
        self.children.extend(children);
        self
    }

    /// Space separated ids of the states entered by default.
    pub fn initial(mut self, targets: &str) -> Self {
        let initial = self.initial.take().unwrap_or_default();
        self.initial = Some(initial.to(targets));
        self
    }

    /// Executable content of the initial transition.
    pub fn initial_action(mut self, action: Action) -> Self {
        let initial = self.initial.take().unwrap_or_default();
        self.initial = Some(initial.action(action));
        self
    }

    pub fn history(mut self, history: HistoryBuilder) -> Self {
        self.histories.push(history);
        self
    }

    pub fn transition(mut self, transition: TransitionBuilder) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn on_entry(mut self, action: Action) -> Self {
        self.on_entry.push(action);
        self
    }

    pub fn on_exit(mut self, action: Action) -> Self {
        self.on_exit.push(action);
        self
    }

    pub fn data(mut self, data: Data) -> Self {
        self.datamodel.push(data);
        self
    }

    pub fn invoke(mut self, invoke: Invoke) -> Self {
        self.invokes.push(invoke);
        self
    }
}

/// Fluent description of a history pseudo-state.
///
/// Without a default, entering an empty history behaves like entering its
/// parent: the parent's initial states (or all regions of a parallel parent).
#[derive(Clone, Debug)]
pub struct HistoryBuilder {
    pub(crate) id: Option<String>,
    pub(crate) depth: HistoryDepth,
    pub(crate) default: Option<TransitionBuilder>,
}

impl HistoryBuilder {
    pub fn shallow(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            depth: HistoryDepth::Shallow,
            default: None,
        }
    }

    pub fn deep(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            depth: HistoryDepth::Deep,
            default: None,
        }
    }

    /// Space separated ids entered while nothing has been recorded yet.
    pub fn default_to(mut self, targets: &str) -> Self {
        let default = self.default.take().unwrap_or_default();
        self.default = Some(default.to(targets));
        self
    }

    /// Executable content of the default transition.
    pub fn default_action(mut self, action: Action) -> Self {
        let default = self.default.take().unwrap_or_default();
        self.default = Some(default.action(action));
        self
    }
}
