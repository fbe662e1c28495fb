//! The phases of a microstep.

use crate::config::ExecutorConfig;
use crate::core::{states_exited, Document, NodeKind, StateId, Status, TransitionId};
use crate::env::{Environment, ErrorKind};
use crate::event::{EventKind, TriggerEvent, DONE_STATE_PREFIX};
use crate::executor::{ExecutorError, Instance};
use crate::legality::{check_configuration, LegalityPolicy};
use crate::semantics::step::{Candidate, Step};
use std::collections::{BTreeSet, HashMap, VecDeque};
use stillwater::validation::Validation;

/// Interpreter semantics applied to one instance.
///
/// Borrowed for the duration of a step: the document is read-only, the
/// instance and the collaborators are updated in place.
pub struct Semantics<'a> {
    pub(crate) document: &'a Document,
    pub(crate) instance: &'a mut Instance,
    pub(crate) env: &'a mut Environment,
    pub(crate) config: &'a ExecutorConfig,
}

impl<'a> Semantics<'a> {
    pub(crate) fn new(
        document: &'a Document,
        instance: &'a mut Instance,
        env: &'a mut Environment,
        config: &'a ExecutorConfig,
    ) -> Self {
        Self {
            document,
            instance,
            env,
            config,
        }
    }

    /// Enters the document's initial configuration.
    pub fn initial_step(&mut self) -> Result<Step, ExecutorError> {
        let mut step = Step::new(None, Status::default());
        self.determine_initial_states(&mut step)?;
        self.execute_actions(&mut step);
        self.assign_status(&mut step)?;
        Ok(step)
    }

    /// Runs one microstep for `event`, or the eventless step when `None`.
    ///
    /// A step without enabled transitions changes nothing.
    pub fn microstep(&mut self, event: Option<TriggerEvent>) -> Result<Step, ExecutorError> {
        self.instance.set_current_event(event.as_ref());
        let before = self.instance.status().clone();
        let mut step = Step::new(event, before);

        self.enumerate_reachable_transitions(&mut step);
        self.filter_transitions(&mut step);
        if !step.has_transitions() {
            return Ok(step);
        }

        self.follow_transitions(&mut step)?;
        self.update_history_states(&step);
        self.execute_actions(&mut step);
        self.assign_status(&mut step)?;
        Ok(step)
    }

    pub(crate) fn determine_initial_states(&mut self, step: &mut Step) -> Result<(), ExecutorError> {
        let seeds = self.document.initial_targets().to_vec();
        if seeds.is_empty() {
            self.env
                .reporter
                .on_error(ErrorKind::NoInitial, "document has no initial states", None);
            return Ok(());
        }

        let targets = self.determine_target_states(step, seeds, &BTreeSet::new());
        self.check_legality(&targets)?;

        let entered = self.document.ancestor_closure(&targets, &BTreeSet::new());
        let mut entry_list: Vec<StateId> = entered.into_iter().collect();
        self.document.sort_entry_order(&mut entry_list);
        step.entry_list = entry_list;
        step.target_states = targets;
        Ok(())
    }

    /// Collects, per active atomic state, the transitions on it and its
    /// ancestors that match the step's event.
    pub(crate) fn enumerate_reachable_transitions(&self, step: &mut Step) {
        let event = step.event.as_ref().map(|e| e.name.as_str());
        let mut candidates = Vec::new();

        for &atomic in step.before.states() {
            let mut transitions = Vec::new();
            let mut cursor = Some(atomic);
            while let Some(state) = cursor {
                transitions.extend(
                    self.document
                        .node(state)
                        .transitions()
                        .iter()
                        .copied()
                        .filter(|tid| self.document.transition(*tid).matches(event)),
                );
                cursor = self.document.parent(state);
            }
            if !transitions.is_empty() {
                candidates.push(Candidate {
                    origin: atomic,
                    transitions,
                });
            }
        }
        step.candidates = candidates;
    }

    /// Picks the first enabled transition per candidate, then drops every
    /// transition that conflicts with one selected earlier.
    pub(crate) fn filter_transitions(&mut self, step: &mut Step) {
        let mut verdicts: HashMap<TransitionId, bool> = HashMap::new();
        let mut selected: Vec<TransitionId> = Vec::new();

        let candidates = std::mem::take(&mut step.candidates);
        for candidate in &candidates {
            for &tid in &candidate.transitions {
                let enabled = match verdicts.get(&tid) {
                    Some(&verdict) => verdict,
                    None => {
                        let verdict = self.guard_holds(tid);
                        verdicts.insert(tid, verdict);
                        verdict
                    }
                };
                if enabled {
                    if !selected.contains(&tid) {
                        selected.push(tid);
                    }
                    break;
                }
            }
        }
        step.candidates = candidates;

        let current = step.before.states();
        let mut kept: Vec<(TransitionId, BTreeSet<StateId>)> = Vec::new();
        for tid in selected {
            let exited = states_exited(self.document, self.document.transition(tid), current);
            match kept.iter().find(|(_, other)| !other.is_disjoint(&exited)) {
                Some((winner, _)) => {
                    let message = format!(
                        "transition {} from '{}' conflicts with {} and is dropped",
                        tid,
                        self.document.id_of(self.document.transition(tid).source()),
                        winner
                    );
                    self.env.reporter.on_error(
                        ErrorKind::NonDeterministic,
                        &message,
                        Some(self.document.id_of(self.document.transition(tid).source())),
                    );
                }
                None => kept.push((tid, exited)),
            }
        }
        step.transitions = kept.into_iter().map(|(tid, _)| tid).collect();
    }

    fn guard_holds(&mut self, tid: TransitionId) -> bool {
        let document = self.document;
        let transition = document.transition(tid);
        let Some(cond) = transition.cond() else {
            return true;
        };
        let scope = self.instance.scope_for(document, transition.source());
        let context = self.instance.contexts().view(scope);
        match self.env.evaluator.eval_cond(&context, cond) {
            Ok(verdict) => verdict,
            Err(err) => {
                self.env.reporter.on_error(
                    ErrorKind::ExpressionError,
                    &err.to_string(),
                    Some(document.id_of(transition.source())),
                );
                false
            }
        }
    }

    /// Computes the exit and entry lists of the selected transitions.
    pub(crate) fn follow_transitions(&mut self, step: &mut Step) -> Result<(), ExecutorError> {
        let document = self.document;
        let current = step.before.states().clone();

        let mut exited = BTreeSet::new();
        for &tid in &step.transitions {
            exited.extend(states_exited(document, document.transition(tid), &current));
        }

        let residual: BTreeSet<StateId> = current.difference(&exited).copied().collect();
        let seeds = self.seed_targets(&residual, &step.transitions);
        let targets = self.determine_target_states(step, seeds, &residual);

        let mut next_atomic = residual;
        next_atomic.extend(targets);
        self.check_legality(&next_atomic)?;

        let remaining: BTreeSet<StateId> = step.before.all_states().difference(&exited).copied().collect();
        let next_active = document.ancestor_closure(&next_atomic, &BTreeSet::new());

        let mut exit_list: Vec<StateId> = exited.into_iter().collect();
        let mut entry_list: Vec<StateId> = next_active.difference(&remaining).copied().collect();
        document.sort_exit_order(&mut exit_list);
        document.sort_entry_order(&mut entry_list);

        step.exit_list = exit_list;
        step.entry_list = entry_list;
        step.target_states = next_atomic;
        Ok(())
    }

    /// Transition targets plus the regions of every parallel state a
    /// transition enters that are not otherwise covered.
    fn seed_targets(&self, residual: &BTreeSet<StateId>, transitions: &[TransitionId]) -> Vec<StateId> {
        let document = self.document;
        let mut seeds: Vec<StateId> = Vec::new();
        let mut regions: Vec<StateId> = Vec::new();

        for &tid in transitions {
            for &target in document.transition(tid).targets() {
                if !seeds.contains(&target) {
                    seeds.push(target);
                }
            }
            for &region in document.path(tid).regions_entered() {
                if let Some(parallel) = document.parent(region) {
                    regions.extend(document.node(parallel).children().iter().copied());
                }
            }
        }

        let covered = document.ancestor_closure(residual.iter().chain(seeds.iter()), &BTreeSet::new());
        for region in regions {
            if !covered.contains(&region) && !seeds.contains(&region) {
                seeds.push(region);
            }
        }
        seeds
    }

    /// Expands seeds into atomic target states through initial transitions,
    /// parallel regions and history pseudo-states.
    ///
    /// Every parallel state on the way to a target ends up with all of its
    /// regions covered, either by `residual` (atomic states that stay
    /// active) or by a default entry of the missing region.
    pub(crate) fn determine_target_states(
        &mut self,
        step: &mut Step,
        seeds: Vec<StateId>,
        residual: &BTreeSet<StateId>,
    ) -> BTreeSet<StateId> {
        let document = self.document;
        let mut work: VecDeque<StateId> = seeds.into_iter().collect();
        let mut visited = BTreeSet::new();
        let mut targets = BTreeSet::new();

        loop {
            self.expand_targets(step, &mut work, &mut visited, &mut targets);

            let covered = document.ancestor_closure(residual.iter().chain(targets.iter()), &BTreeSet::new());
            let missing: Vec<StateId> = covered
                .iter()
                .filter(|s| document.node(**s).kind() == NodeKind::Parallel)
                .flat_map(|p| document.node(*p).children().iter().copied())
                .filter(|region| !covered.contains(region) && !visited.contains(region))
                .collect();
            if missing.is_empty() {
                return targets;
            }
            work.extend(missing);
        }
    }

    fn expand_targets(
        &mut self,
        step: &mut Step,
        work: &mut VecDeque<StateId>,
        visited: &mut BTreeSet<StateId>,
        targets: &mut BTreeSet<StateId>,
    ) {
        let document = self.document;
        while let Some(state) = work.pop_front() {
            if !visited.insert(state) {
                continue;
            }
            let node = document.node(state);
            match node.kind() {
                NodeKind::Simple | NodeKind::Final => {
                    targets.insert(state);
                }
                NodeKind::Composite => {
                    let already_covered = work
                        .iter()
                        .chain(targets.iter())
                        .any(|s| document.is_descendant(*s, state));
                    if already_covered {
                        continue;
                    }
                    match node.initial().and_then(|i| document.node(i).transitions().first()) {
                        Some(&tid) => {
                            step.default_entry.insert(state);
                            work.extend(document.transition(tid).targets().iter().copied());
                        }
                        None => self.env.reporter.on_error(
                            ErrorKind::NoInitial,
                            "compound state has no initial transition",
                            Some(node.id()),
                        ),
                    }
                }
                NodeKind::Parallel => {
                    work.extend(node.children().iter().copied());
                }
                NodeKind::History(_) => match self.instance.histories().last_configuration(state) {
                    Some(recorded) if !recorded.is_empty() => {
                        work.extend(recorded.iter().copied());
                    }
                    _ => {
                        if let Some(&tid) = node.transitions().first() {
                            step.history_transitions.insert(state, tid);
                            work.extend(document.transition(tid).targets().iter().copied());
                        }
                    }
                },
                NodeKind::Initial => {
                    if let Some(&tid) = node.transitions().first() {
                        work.extend(document.transition(tid).targets().iter().copied());
                    }
                }
            }
        }
    }

    fn check_legality(&self, states: &BTreeSet<StateId>) -> Result<(), ExecutorError> {
        if !self.config.check_legality {
            return Ok(());
        }
        match check_configuration(self.document, states) {
            Validation::Success(()) => Ok(()),
            Validation::Failure(violations) => {
                for violation in violations.iter() {
                    self.env
                        .reporter
                        .on_error(ErrorKind::IllegalConfig, &violation.to_string(), violation.state());
                }
                match self.config.legality {
                    LegalityPolicy::Warn => Ok(()),
                    LegalityPolicy::Fatal => Err(ExecutorError::IllegalConfiguration(
                        violations
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join("; "),
                    )),
                }
            }
        }
    }

    /// Records histories of every state about to be exited.
    pub(crate) fn update_history_states(&mut self, step: &Step) {
        for &state in &step.exit_list {
            self.instance
                .histories
                .record_exit(self.document, state, &step.before);
        }
    }

    /// Runs exit actions, transition actions and entry actions in order.
    pub(crate) fn execute_actions(&mut self, step: &mut Step) {
        let document = self.document;

        for &state in &step.exit_list {
            self.run_actions(document.node(state).on_exit(), state);
            self.cancel_invokes(state);
            self.instance.pending_invokes.remove(&state);
            self.instance.completed.remove(&state);
            if document.node(state).kind() == NodeKind::Final {
                self.reopen(state);
            }
        }

        for &tid in &step.transitions {
            let transition = document.transition(tid);
            self.run_actions(transition.actions(), transition.source());
        }

        for &state in &step.entry_list {
            let node = document.node(state);
            self.instance.completed.remove(&state);
            self.run_actions(node.on_entry(), state);

            if step.default_entry.contains(&state) {
                if let Some(&tid) = node.initial().and_then(|i| document.node(i).transitions().first()) {
                    self.run_actions(document.transition(tid).actions(), state);
                }
            }
            for history in node.histories() {
                if let Some(&tid) = step.history_transitions.get(history) {
                    self.run_actions(document.transition(tid).actions(), state);
                }
            }

            if !node.invokes().is_empty() {
                step.states_to_invoke.insert(state);
                self.instance.pending_invokes.insert(state);
            }
            if node.kind() == NodeKind::Final {
                self.complete(state);
            }
        }
    }

    /// Marks the parent of an entered final state done and raises the
    /// matching completion events.
    fn complete(&mut self, final_state: StateId) {
        let document = self.document;
        let Some(parent) = document.parent(final_state) else {
            return;
        };

        if document.node(parent).kind() == NodeKind::Parallel {
            self.instance.completed.insert(final_state);
            self.complete_parallel(parent);
            return;
        }

        self.instance.completed.insert(parent);
        self.raise_done(parent);
        if let Some(grandparent) = document.parent(parent) {
            if document.node(grandparent).kind() == NodeKind::Parallel {
                self.complete_parallel(grandparent);
            }
        }
    }

    /// Withdraws the completion flags set when `final_state` was entered.
    fn reopen(&mut self, final_state: StateId) {
        let document = self.document;
        let Some(parent) = document.parent(final_state) else {
            return;
        };
        self.instance.completed.remove(&parent);
        if let Some(grandparent) = document.parent(parent) {
            if document.node(grandparent).kind() == NodeKind::Parallel {
                self.instance.completed.remove(&grandparent);
            }
        }
    }

    fn complete_parallel(&mut self, parallel: StateId) {
        let document = self.document;
        let regions = document.node(parallel).children();
        if regions.iter().all(|r| self.instance.completed.contains(r)) && self.instance.completed.insert(parallel) {
            self.raise_done(parallel);
        }
    }

    fn raise_done(&mut self, state: StateId) {
        let name = format!("{DONE_STATE_PREFIX}{}", self.document.id_of(state));
        self.instance.raise(TriggerEvent::new(name, EventKind::Change));
    }

    /// Applies the exit and entry lists to the configuration.
    pub(crate) fn assign_status(&mut self, step: &mut Step) -> Result<(), ExecutorError> {
        for &state in &step.exit_list {
            self.instance
                .configuration
                .exit_state(self.document.node(state))?;
        }
        for &state in &step.entry_list {
            self.instance
                .configuration
                .enter_state(self.document.node(state))?;
        }
        self.instance.refresh_status(self.document);
        step.after = self.instance.status().clone();
        Ok(())
    }
}
