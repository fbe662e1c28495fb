//! Structural validation of assembled documents.

use crate::builder::error::ModelError;
use crate::core::{Document, HistoryDepth, NodeKind, StateId};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ModelError>>;

/// Validates a lowered document, accumulating every error.
pub fn validate_document(document: &Document) -> Check {
    let mut checks: Vec<Check> = Vec::new();

    checks.push(check_targets(document, "<document>", document.initial_targets()));

    for node in document.nodes() {
        match node.kind() {
            NodeKind::Initial => {
                let Some(parent) = node.parent() else { continue };
                for &tid in node.transitions() {
                    let targets = document.transition(tid).targets();
                    for &target in targets {
                        let check = if document.is_descendant(target, parent) {
                            Validation::success(())
                        } else {
                            Validation::fail(ModelError::IllegalInitial {
                                state: document.id_of(parent).to_string(),
                                target: document.id_of(target).to_string(),
                            })
                        };
                        checks.push(check);
                    }
                    checks.push(check_targets(document, document.id_of(parent), targets));
                }
            }
            NodeKind::History(depth) => {
                let Some(parent) = node.parent() else { continue };
                let Some(&tid) = node.transitions().first() else { continue };
                for &target in document.transition(tid).targets() {
                    let (legal, expected) = match depth {
                        HistoryDepth::Shallow => (document.parent(target) == Some(parent), "children"),
                        HistoryDepth::Deep => (document.is_descendant(target, parent), "descendants"),
                    };
                    let check = if legal {
                        Validation::success(())
                    } else {
                        Validation::fail(ModelError::IllegalHistoryDefault {
                            history: node.id().to_string(),
                            parent: document.id_of(parent).to_string(),
                            target: document.id_of(target).to_string(),
                            expected,
                        })
                    };
                    checks.push(check);
                }
            }
            _ => {
                for invoke in node.invokes() {
                    let check = if invoke.kind.trim().is_empty() {
                        Validation::fail(ModelError::InvokeWithoutType(node.id().to_string()))
                    } else {
                        Validation::success(())
                    };
                    checks.push(check);
                }
                for &tid in node.transitions() {
                    checks.push(check_targets(document, node.id(), document.transition(tid).targets()));
                }
            }
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

fn check_targets(document: &Document, owner: &str, targets: &[StateId]) -> Check {
    if targets_are_compatible(document, targets) {
        Validation::success(())
    } else {
        Validation::fail(ModelError::IllegalMultiTarget {
            state: owner.to_string(),
            targets: document.ids_of(targets),
        })
    }
}

/// Whether `targets` can be active at the same time: no two of them are
/// related by ancestry, and every pair meets at a parallel state.
pub fn targets_are_compatible(document: &Document, targets: &[StateId]) -> bool {
    for (position, &a) in targets.iter().enumerate() {
        for &b in &targets[position + 1..] {
            if a == b || document.is_descendant(a, b) || document.is_descendant(b, a) {
                return false;
            }
            match document.lca(a, b) {
                Some(common) if document.node(common).kind() == NodeKind::Parallel => {}
                _ => return false,
            }
        }
    }
    true
}
