//! Transition paths: which part of the tree a transition leaves and enters.

use crate::core::document::Document;
use crate::core::node::{NodeKind, StateId};
use crate::core::transition::{Transition, TransitionKind};
use std::collections::BTreeSet;

/// The precomputed route of a transition through the state tree.
///
/// The scope is the innermost state that the transition neither exits nor
/// enters; `None` means the transition crosses the top level. The upward
/// segment runs from the source up to (not including) the scope, the
/// downward segment from below the scope down to the targets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    scope: Option<StateId>,
    upward: Vec<StateId>,
    downward: Vec<StateId>,
    cross_region: bool,
    regions_exited: Vec<StateId>,
    regions_entered: Vec<StateId>,
}

impl Path {
    pub fn compute(document: &Document, source: StateId, targets: &[StateId], kind: TransitionKind) -> Self {
        if targets.is_empty() {
            return Self {
                scope: Some(source),
                upward: Vec::new(),
                downward: Vec::new(),
                cross_region: false,
                regions_exited: Vec::new(),
                regions_entered: Vec::new(),
            };
        }

        let scope = transition_scope(document, source, targets, kind);

        let mut upward = Vec::new();
        let mut cursor = Some(source);
        while cursor != scope {
            let Some(state) = cursor else { break };
            upward.push(state);
            cursor = document.parent(state);
        }

        let mut downward = Vec::new();
        for &target in targets {
            let mut cursor = Some(target);
            while cursor != scope {
                let Some(state) = cursor else { break };
                if !downward.contains(&state) {
                    downward.push(state);
                }
                cursor = document.parent(state);
            }
        }
        document.sort_entry_order(&mut downward);

        let regions_exited: Vec<StateId> = upward.iter().copied().filter(|s| document.is_region(*s)).collect();
        let regions_entered: Vec<StateId> = downward.iter().copied().filter(|s| document.is_region(*s)).collect();
        let cross_region = !regions_exited.is_empty() || !regions_entered.is_empty();

        Self {
            scope,
            upward,
            downward,
            cross_region,
            regions_exited,
            regions_entered,
        }
    }

    pub fn scope(&self) -> Option<StateId> {
        self.scope
    }

    /// Source and its ancestors below the scope, innermost first.
    pub fn upward_segment(&self) -> &[StateId] {
        &self.upward
    }

    /// Targets and their ancestors below the scope, outermost first.
    pub fn downward_segment(&self) -> &[StateId] {
        &self.downward
    }

    pub fn is_cross_region(&self) -> bool {
        self.cross_region
    }

    pub fn regions_exited(&self) -> &[StateId] {
        &self.regions_exited
    }

    pub fn regions_entered(&self) -> &[StateId] {
        &self.regions_entered
    }
}

fn transition_scope(document: &Document, source: StateId, targets: &[StateId], kind: TransitionKind) -> Option<StateId> {
    let internal = kind == TransitionKind::Internal
        && document.node(source).kind() == NodeKind::Composite
        && targets.iter().all(|t| document.is_descendant(*t, source));
    if internal {
        return Some(source);
    }

    let mut scope = targets
        .iter()
        .try_fold(source, |lca, target| document.lca(lca, *target));

    // Parallel states cannot be a scope: their regions are left and entered together.
    while let Some(candidate) = scope {
        let node = document.node(candidate);
        if node.kind() == NodeKind::Parallel || candidate == source || targets.contains(&candidate) {
            scope = node.parent();
        } else {
            break;
        }
    }
    scope
}

/// States left when `transition` fires from the atomic configuration `current`.
///
/// Covers the upward segment, the active descendants of the source and, for
/// every region the transition leaves, the active part of its sibling regions.
/// Targetless transitions exit nothing.
pub fn states_exited(document: &Document, transition: &Transition, current: &BTreeSet<StateId>) -> BTreeSet<StateId> {
    let mut exited = BTreeSet::new();
    if transition.is_targetless() {
        return exited;
    }

    let path = document.path(transition.id());
    exited.extend(path.upward_segment().iter().copied());

    let source = transition.source();
    for &active in current {
        if document.is_descendant(active, source) {
            mark_branch(document, active, source, &mut exited);
        }
    }

    for &region in path.regions_exited() {
        let Some(parallel) = document.parent(region) else {
            continue;
        };
        for &sibling in document.node(parallel).children() {
            for &active in current {
                if active == sibling || document.is_descendant(active, sibling) {
                    exited.insert(sibling);
                    mark_branch(document, active, sibling, &mut exited);
                }
            }
        }
    }
    exited
}

/// Whether two transitions would exit a common state.
pub fn in_conflict(document: &Document, t1: &Transition, t2: &Transition, current: &BTreeSet<StateId>) -> bool {
    !states_exited(document, t1, current).is_disjoint(&states_exited(document, t2, current))
}

/// Adds `from` and its ancestors up to, but excluding, `stop`.
fn mark_branch(document: &Document, from: StateId, stop: StateId, exited: &mut BTreeSet<StateId>) {
    let mut cursor = Some(from);
    while let Some(state) = cursor {
        if state == stop || !exited.insert(state) {
            break;
        }
        cursor = document.parent(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{DocumentBuilder, StateBuilder, TransitionBuilder};

    // S( A(A1 -> A2 on go, A2), P(R1(X1 -> X2 on x, X2 -> B on out), R2(Y1)), B ) with
    // an internal transition on A targeting A2 and a self-transition on A1.
    fn document() -> Document {
        DocumentBuilder::new()
            .state(
                StateBuilder::new("S")
                    .state(
                        StateBuilder::new("A")
                            .transition(TransitionBuilder::on("inner").to("A2").internal())
                            .transition(TransitionBuilder::on("outer").to("A2"))
                            .state(
                                StateBuilder::new("A1")
                                    .transition(TransitionBuilder::on("go").to("A2"))
                                    .transition(TransitionBuilder::on("self").to("A1"))
                                    .transition(TransitionBuilder::on("stay")),
                            )
                            .state(StateBuilder::new("A2")),
                    )
                    .state(
                        StateBuilder::parallel("P")
                            .state(
                                StateBuilder::new("R1")
                                    .state(StateBuilder::new("X1").transition(TransitionBuilder::on("x").to("X2")))
                                    .state(StateBuilder::new("X2").transition(TransitionBuilder::on("out").to("B"))),
                            )
                            .state(StateBuilder::new("R2").state(StateBuilder::new("Y1"))),
                    )
                    .state(StateBuilder::new("B")),
            )
            .build()
            .unwrap()
    }

    fn id(doc: &Document, name: &str) -> StateId {
        doc.lookup(name).unwrap()
    }

    fn transition_on<'a>(doc: &'a Document, state: &str, event: &str) -> &'a Transition {
        let node = doc.node(id(doc, state));
        node.transitions()
            .iter()
            .map(|t| doc.transition(*t))
            .find(|t| t.matches(Some(event)))
            .unwrap()
    }

    fn set(doc: &Document, names: &[&str]) -> BTreeSet<StateId> {
        names.iter().map(|n| id(doc, n)).collect()
    }

    #[test]
    fn sibling_transition_is_scoped_by_parent() {
        let doc = document();
        let t = transition_on(&doc, "A1", "go");
        let path = doc.path(t.id());

        assert_eq!(path.scope(), Some(id(&doc, "A")));
        assert_eq!(doc.ids_of(path.upward_segment()), vec!["A1"]);
        assert_eq!(doc.ids_of(path.downward_segment()), vec!["A2"]);
        assert!(!path.is_cross_region());
    }

    #[test]
    fn self_transition_exits_and_reenters_source() {
        let doc = document();
        let t = transition_on(&doc, "A1", "self");
        let path = doc.path(t.id());

        assert_eq!(path.scope(), Some(id(&doc, "A")));
        assert_eq!(doc.ids_of(path.upward_segment()), vec!["A1"]);
        assert_eq!(doc.ids_of(path.downward_segment()), vec!["A1"]);
    }

    #[test]
    fn internal_transition_keeps_source() {
        let doc = document();
        let t = transition_on(&doc, "A", "inner");
        let path = doc.path(t.id());

        assert_eq!(path.scope(), Some(id(&doc, "A")));
        assert!(path.upward_segment().is_empty());

        let exited = states_exited(&doc, t, &set(&doc, &["A1"]));
        assert_eq!(exited, set(&doc, &["A1"]));
    }

    #[test]
    fn external_transition_to_descendant_exits_source() {
        let doc = document();
        let t = transition_on(&doc, "A", "outer");
        let path = doc.path(t.id());

        assert_eq!(path.scope(), Some(id(&doc, "S")));
        let exited = states_exited(&doc, t, &set(&doc, &["A1"]));
        assert_eq!(exited, set(&doc, &["A", "A1"]));
    }

    #[test]
    fn leaving_a_region_exits_sibling_regions() {
        let doc = document();
        let t = transition_on(&doc, "X2", "out");
        let path = doc.path(t.id());

        assert_eq!(path.scope(), Some(id(&doc, "S")));
        assert!(path.is_cross_region());
        assert_eq!(doc.ids_of(path.regions_exited()), vec!["R1"]);

        let exited = states_exited(&doc, t, &set(&doc, &["X2", "Y1"]));
        assert_eq!(exited, set(&doc, &["P", "R1", "R2", "X2", "Y1"]));
    }

    #[test]
    fn transition_within_region_stays_in_region() {
        let doc = document();
        let t = transition_on(&doc, "X1", "x");
        let path = doc.path(t.id());

        assert_eq!(path.scope(), Some(id(&doc, "R1")));
        assert!(!path.is_cross_region());
        assert_eq!(states_exited(&doc, t, &set(&doc, &["X1", "Y1"])), set(&doc, &["X1"]));
    }

    #[test]
    fn targetless_transition_exits_nothing() {
        let doc = document();
        let t = transition_on(&doc, "A1", "stay");

        assert_eq!(doc.path(t.id()).scope(), Some(id(&doc, "A1")));
        assert!(states_exited(&doc, t, &set(&doc, &["A1"])).is_empty());
    }

    #[test]
    fn overlapping_exit_sets_conflict() {
        let doc = document();
        let current = set(&doc, &["A1"]);
        let go = transition_on(&doc, "A1", "go");
        let outer = transition_on(&doc, "A", "outer");
        let stay = transition_on(&doc, "A1", "stay");

        assert!(in_conflict(&doc, go, outer, &current));
        assert!(!in_conflict(&doc, go, stay, &current));
    }
}
