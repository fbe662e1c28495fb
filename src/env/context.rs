//! Variable scopes for the datamodel.
//!
//! Scopes form a chain: the system scope holds the reserved `_` variables,
//! the global scope the document datamodel, and every state gets a scope
//! whose parent is its parent state's scope. Lookups walk the chain outward.

use serde_json::Value;
use std::collections::BTreeMap;

/// `_sessionid`: unique id of the running session.
pub const SESSION_ID_KEY: &str = "_sessionid";
/// `_name`: name of the document.
pub const NAME_KEY: &str = "_name";
/// `_event`: the event currently being processed.
pub const EVENT_KEY: &str = "_event";
/// `_ALL_STATES`: ids of all active states.
pub const ALL_STATES_KEY: &str = "_ALL_STATES";

/// Whether `name` is a reserved system variable that executable content may not assign.
pub fn is_system_variable(name: &str) -> bool {
    matches!(name, SESSION_ID_KEY | NAME_KEY | EVENT_KEY | ALL_STATES_KEY)
}

/// Handle of a scope inside a [`ContextStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

#[derive(Clone, Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    vars: BTreeMap<String, Value>,
}

/// Arena of variable scopes owned by one executor instance.
#[derive(Clone, Debug, Default)]
pub struct ContextStore {
    scopes: Vec<Scope>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            vars: BTreeMap::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    /// Looks `name` up in `scope` and then its ancestors.
    pub fn get(&self, scope: ScopeId, name: &str) -> Option<&Value> {
        let mut cursor = Some(scope);
        while let Some(current) = cursor {
            let entry = &self.scopes[current.0];
            if let Some(value) = entry.vars.get(name) {
                return Some(value);
            }
            cursor = entry.parent;
        }
        None
    }

    pub fn has(&self, scope: ScopeId, name: &str) -> bool {
        self.get(scope, name).is_some()
    }

    pub fn has_local(&self, scope: ScopeId, name: &str) -> bool {
        self.scopes[scope.0].vars.contains_key(name)
    }

    /// Assigns to the nearest scope defining `name`, or declares it in `scope`.
    pub fn set(&mut self, scope: ScopeId, name: impl Into<String>, value: Value) {
        let name = name.into();
        let mut cursor = Some(scope);
        while let Some(current) = cursor {
            if self.scopes[current.0].vars.contains_key(&name) {
                self.scopes[current.0].vars.insert(name, value);
                return;
            }
            cursor = self.scopes[current.0].parent;
        }
        self.set_local(scope, name, value);
    }

    /// Declares or overwrites `name` in `scope` itself.
    pub fn set_local(&mut self, scope: ScopeId, name: impl Into<String>, value: Value) {
        self.scopes[scope.0].vars.insert(name.into(), value);
    }

    pub fn remove_local(&mut self, scope: ScopeId, name: &str) -> Option<Value> {
        self.scopes[scope.0].vars.remove(name)
    }

    /// Variables declared directly in `scope`.
    pub fn vars(&self, scope: ScopeId) -> &BTreeMap<String, Value> {
        &self.scopes[scope.0].vars
    }

    /// Drops every variable declared in `scope`.
    pub fn reset(&mut self, scope: ScopeId) {
        self.scopes[scope.0].vars.clear();
    }

    /// Removes all scopes; previously returned ids become invalid.
    pub fn clear(&mut self) {
        self.scopes.clear();
    }

    pub fn view(&self, scope: ScopeId) -> Context<'_> {
        Context { store: self, scope }
    }
}

/// Read-only view of one scope and its ancestors, handed to evaluators.
#[derive(Clone, Copy, Debug)]
pub struct Context<'a> {
    store: &'a ContextStore,
    scope: ScopeId,
}

impl<'a> Context<'a> {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.store.get(self.scope, name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.store.has(self.scope, name)
    }

    pub fn parent(&self) -> Option<Context<'a>> {
        self.store.parent(self.scope).map(|scope| Context {
            store: self.store,
            scope,
        })
    }

    /// Variables declared directly in this scope.
    pub fn vars(&self) -> &'a BTreeMap<String, Value> {
        self.store.vars(self.scope)
    }
}
