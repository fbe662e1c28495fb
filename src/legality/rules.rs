//! Legality rules for active configurations, checked with Validation.

use crate::core::{Document, NodeKind, StateId};
use crate::legality::violations::ConfigurationViolation;
use std::collections::{BTreeMap, BTreeSet};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Checks a set of atomic states against the configuration rules.
///
/// Every compound ancestor must have exactly one active child, every parallel
/// ancestor all of its regions, and at most one top-level state may be active.
/// All violations are accumulated instead of stopping at the first one.
pub fn check_configuration(
    document: &Document,
    states: &BTreeSet<StateId>,
) -> Validation<(), NonEmptyVec<ConfigurationViolation>> {
    let mut active_children: BTreeMap<StateId, BTreeSet<StateId>> = BTreeMap::new();
    let mut top_level = BTreeSet::new();

    for &state in states {
        let mut child = state;
        while let Some(parent) = document.parent(child) {
            active_children.entry(parent).or_default().insert(child);
            child = parent;
        }
        top_level.insert(child);
    }

    let mut checks: Vec<Validation<(), NonEmptyVec<ConfigurationViolation>>> = Vec::new();

    for (&state, children) in &active_children {
        let node = document.node(state);
        let check = if node.kind() == NodeKind::Parallel {
            if children.len() < node.children().len() {
                Validation::fail(ConfigurationViolation::IncompleteParallel {
                    parallel: node.id().to_string(),
                    active: children.len(),
                    regions: node.children().len(),
                })
            } else {
                Validation::success(())
            }
        } else if children.len() > 1 {
            Validation::fail(ConfigurationViolation::MultipleActiveChildren {
                state: node.id().to_string(),
                children: document.ids_of(children),
            })
        } else {
            Validation::success(())
        };
        checks.push(check);
    }

    if top_level.len() > 1 {
        checks.push(Validation::fail(ConfigurationViolation::MultipleTopLevel {
            states: document.ids_of(&top_level),
        }));
    }

    Validation::all_vec(checks).map(|_| ())
}
