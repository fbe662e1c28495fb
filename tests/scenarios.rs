//! End-to-end behaviour of the executor on small documents.

mod common;

use common::{harness, harness_with, ExprEvaluator};
use harel::builder::{DocumentBuilder, ExecutorBuilder, HistoryBuilder, StateBuilder, TransitionBuilder};
use harel::core::{Action, Data, Document, Invoke, SendAction};
use harel::env::{CollectingErrorReporter, ErrorKind, LoopbackDispatcher};
use harel::legality::LegalityPolicy;
use harel::{EventQueue, ExecutorConfig, ExecutorError, TriggerEvent};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

fn send(event: &str) -> Action {
    Action::send(SendAction::event(event))
}

#[test]
fn sibling_transition_moves_within_compound() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("A")
                .state(StateBuilder::new("A1").transition(TransitionBuilder::on("go").to("A2")))
                .state(StateBuilder::new("A2")),
        )
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert_eq!(h.executor.active_ids(), vec!["A", "A1"]);

    let steps = h.executor.trigger_event(TriggerEvent::signal("go")).unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].event.as_deref(), Some("go"));
    assert_eq!(steps[0].exited, vec!["A1"]);
    assert_eq!(steps[0].entered, vec!["A2"]);
    assert_eq!(h.executor.active_ids(), vec!["A", "A2"]);
}

#[test]
fn shallow_history_restores_last_child() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("B")
                .history(HistoryBuilder::shallow("H"))
                .state(StateBuilder::new("B1").transition(TransitionBuilder::on("next").to("B2")))
                .state(StateBuilder::new("B2"))
                .transition(TransitionBuilder::on("leave").to("C")),
        )
        .state(StateBuilder::new("C").transition(TransitionBuilder::on("back").to("H")))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor
        .trigger_events(["next", "leave"].map(TriggerEvent::signal))
        .unwrap();
    assert_eq!(h.executor.active_ids(), vec!["C"]);

    h.executor.trigger_event(TriggerEvent::signal("back")).unwrap();
    assert_eq!(h.executor.active_ids(), vec!["B", "B2"]);
}

#[test]
fn empty_history_uses_its_default() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("B")
                .history(
                    HistoryBuilder::shallow("H")
                        .default_to("B2")
                        .default_action(send("history.default")),
                )
                .state(StateBuilder::new("B1"))
                .state(StateBuilder::new("B2")),
        )
        .state(StateBuilder::new("C").transition(TransitionBuilder::on("back").to("H")))
        .initial("C")
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor.trigger_event(TriggerEvent::signal("back")).unwrap();

    assert_eq!(h.executor.active_ids(), vec!["B", "B2"]);
    assert_eq!(h.dispatcher.events(), vec!["history.default"]);
}

#[test]
fn deep_history_restores_nested_configuration() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("D")
                .history(HistoryBuilder::deep("DH"))
                .state(
                    StateBuilder::new("D1")
                        .state(StateBuilder::new("D11").transition(TransitionBuilder::on("deeper").to("D12")))
                        .state(StateBuilder::new("D12")),
                )
                .state(StateBuilder::new("D2"))
                .transition(TransitionBuilder::on("leave").to("E")),
        )
        .state(StateBuilder::new("E").transition(TransitionBuilder::on("back").to("DH")))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor
        .trigger_events(["deeper", "leave", "back"].map(TriggerEvent::signal))
        .unwrap();

    assert_eq!(h.executor.active_ids(), vec!["D", "D1", "D12"]);
}

#[test]
fn partial_parallel_configuration_is_illegal() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::parallel("P")
                .state(StateBuilder::new("R1"))
                .state(StateBuilder::new("R2")),
        )
        .build()
        .unwrap();
    let reporter = CollectingErrorReporter::new();

    let r1 = document.lookup("R1").unwrap();
    let r2 = document.lookup("R2").unwrap();
    let only_r1: BTreeSet<_> = [r1].into_iter().collect();
    let both: BTreeSet<_> = [r1, r2].into_iter().collect();

    assert!(!document.is_legal_configuration(&only_r1, &reporter));
    assert_eq!(reporter.count(ErrorKind::IllegalConfig), 1);
    assert_eq!(reporter.errors()[0].related.as_deref(), Some("P"));

    reporter.clear();
    assert!(document.is_legal_configuration(&both, &reporter));
    assert!(reporter.is_empty());
}

#[test]
fn exit_and_entry_actions_run_deepest_first_then_shallowest_first() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("S")
                .on_exit(send("exit.S"))
                .state(
                    StateBuilder::new("A")
                        .on_exit(send("exit.A"))
                        .state(
                            StateBuilder::new("A1")
                                .on_exit(send("exit.A1"))
                                .transition(TransitionBuilder::on("jump").to("T1").action(send("transition"))),
                        ),
                ),
        )
        .state(
            StateBuilder::new("T").on_entry(send("enter.T")).state(
                StateBuilder::new("T1")
                    .on_entry(send("enter.T1"))
                    .state(StateBuilder::new("T11").on_entry(send("enter.T11"))),
            ),
        )
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.dispatcher.clear();

    let steps = h.executor.trigger_event(TriggerEvent::signal("jump")).unwrap();
    assert_eq!(
        h.dispatcher.events(),
        vec!["exit.A1", "exit.A", "exit.S", "transition", "enter.T", "enter.T1", "enter.T11"]
    );
    assert_eq!(steps[0].exited, vec!["A1", "A", "S"]);
    assert_eq!(steps[0].entered, vec!["T", "T1", "T11"]);
}

#[test]
fn initial_transition_actions_follow_parent_entry() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("A")
                .on_entry(send("enter.A"))
                .initial("A2")
                .initial_action(send("initial.A"))
                .state(StateBuilder::new("A1"))
                .state(StateBuilder::new("A2").on_entry(send("enter.A2"))),
        )
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert_eq!(h.executor.active_ids(), vec!["A", "A2"]);
    assert_eq!(h.dispatcher.events(), vec!["enter.A", "initial.A", "enter.A2"]);
}

#[test]
fn conflicting_transitions_keep_the_first_selected() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::parallel("P")
                .state(StateBuilder::new("R1").state(StateBuilder::new("A1").transition(TransitionBuilder::on("e").to("Out"))))
                .state(
                    StateBuilder::new("R2")
                        .state(StateBuilder::new("B1").transition(TransitionBuilder::on("e").to("B2")))
                        .state(StateBuilder::new("B2")),
                ),
        )
        .state(StateBuilder::new("Out"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    let steps = h.executor.trigger_event(TriggerEvent::signal("e")).unwrap();

    assert_eq!(steps[0].transitions.len(), 1);
    assert_eq!(steps[0].transitions[0].source, "A1");
    assert_eq!(h.executor.active_ids(), vec!["Out"]);
    assert_eq!(h.reporter.count(ErrorKind::NonDeterministic), 1);
    assert_eq!(h.reporter.errors()[0].related.as_deref(), Some("B1"));
}

#[test]
fn non_conflicting_transitions_in_regions_fire_together() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::parallel("P")
                .state(
                    StateBuilder::new("R1")
                        .state(StateBuilder::new("A1").transition(TransitionBuilder::on("e").to("A2")))
                        .state(StateBuilder::new("A2")),
                )
                .state(
                    StateBuilder::new("R2")
                        .state(StateBuilder::new("B1").transition(TransitionBuilder::on("e").to("B2")))
                        .state(StateBuilder::new("B2")),
                ),
        )
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert_eq!(h.executor.active_ids(), vec!["P", "R1", "A1", "R2", "B1"]);

    let steps = h.executor.trigger_event(TriggerEvent::signal("e")).unwrap();
    assert_eq!(steps[0].transitions.len(), 2);
    assert_eq!(h.executor.active_ids(), vec!["P", "R1", "A2", "R2", "B2"]);
}

#[test]
fn multi_target_transition_enters_every_region() {
    let document = DocumentBuilder::new()
        .state(StateBuilder::new("Idle").transition(TransitionBuilder::on("start").to("A2 B2")))
        .state(
            StateBuilder::parallel("P")
                .state(StateBuilder::new("R1").state(StateBuilder::new("A1")).state(StateBuilder::new("A2")))
                .state(StateBuilder::new("R2").state(StateBuilder::new("B1")).state(StateBuilder::new("B2"))),
        )
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor.trigger_event(TriggerEvent::signal("start")).unwrap();
    assert_eq!(h.executor.active_ids(), vec!["P", "R1", "A2", "R2", "B2"]);
}

#[test]
fn entering_one_region_enters_its_siblings_by_default() {
    let document = DocumentBuilder::new()
        .state(StateBuilder::new("Idle").transition(TransitionBuilder::on("start").to("A2")))
        .state(
            StateBuilder::parallel("P")
                .state(StateBuilder::new("R1").state(StateBuilder::new("A1")).state(StateBuilder::new("A2")))
                .state(StateBuilder::new("R2").state(StateBuilder::new("B1")).state(StateBuilder::new("B2"))),
        )
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor.trigger_event(TriggerEvent::signal("start")).unwrap();
    assert_eq!(h.executor.active_ids(), vec!["P", "R1", "A2", "R2", "B1"]);
    assert!(h.reporter.is_empty());
}

fn split_region() -> StateBuilder {
    StateBuilder::parallel("P")
        .state(
            StateBuilder::new("R1")
                .state(StateBuilder::new("X2"))
                .state(StateBuilder::new("X")),
        )
        .state(StateBuilder::new("R2").state(StateBuilder::new("Y")))
}

#[test]
fn document_initial_inside_a_region_enters_its_siblings() {
    let document = DocumentBuilder::new().initial("X").state(split_region()).build().unwrap();
    let config = ExecutorConfig::builder().legality(LegalityPolicy::Fatal).build();
    let mut h = harness_with(Arc::new(document), config);

    h.executor.go().unwrap();
    assert_eq!(h.executor.active_ids(), vec!["P", "R1", "X", "R2", "Y"]);
    assert!(h.executor.is_running());
    assert!(h.reporter.is_empty());
}

#[test]
fn compound_initial_inside_a_region_enters_its_siblings() {
    let document = DocumentBuilder::new()
        .state(StateBuilder::new("A").initial("X").state(split_region()))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert_eq!(h.executor.active_ids(), vec!["A", "P", "R1", "X", "R2", "Y"]);
    assert!(h.reporter.is_empty());
}

#[test]
fn history_default_inside_a_region_enters_its_siblings() {
    let document = DocumentBuilder::new()
        .state(StateBuilder::new("Idle").transition(TransitionBuilder::on("back").to("AHistory")))
        .state(
            StateBuilder::new("A")
                .history(HistoryBuilder::deep("AHistory").default_to("X"))
                .state(split_region()),
        )
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor.trigger_event(TriggerEvent::signal("back")).unwrap();
    assert_eq!(h.executor.active_ids(), vec!["A", "P", "R1", "X", "R2", "Y"]);
    assert!(h.reporter.is_empty());
}

#[test]
fn region_leaving_its_final_state_is_no_longer_done() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::parallel("P")
                .state(
                    StateBuilder::new("R1")
                        .state(StateBuilder::final_state("RF"))
                        .state(StateBuilder::new("R1b"))
                        .transition(TransitionBuilder::on("reopen").to("R1b").internal()),
                )
                .state(
                    StateBuilder::new("R2")
                        .state(StateBuilder::new("Y").transition(TransitionBuilder::on("finish").to("YF")))
                        .state(StateBuilder::final_state("YF")),
                )
                .transition(TransitionBuilder::on("done.state.P").to("Out")),
        )
        .state(StateBuilder::new("Out"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor.trigger_event(TriggerEvent::signal("reopen")).unwrap();
    assert_eq!(h.executor.active_ids(), vec!["P", "R1", "R1b", "R2", "Y"]);

    h.executor.trigger_event(TriggerEvent::signal("finish")).unwrap();
    assert_eq!(h.executor.active_ids(), vec!["P", "R1", "R1b", "R2", "YF"]);
    assert!(!h.executor.is_active("Out"));
}

#[test]
fn top_level_final_state_finishes_the_session() {
    let document = DocumentBuilder::new()
        .state(StateBuilder::new("Work").transition(TransitionBuilder::on("finish").to("Done")))
        .state(StateBuilder::final_state("Done"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert!(!h.executor.status().is_final());

    h.executor.trigger_event(TriggerEvent::signal("finish")).unwrap();
    let status = h.executor.status();
    assert!(status.is_final());
    assert_eq!(status.final_state(), h.executor.document().lookup("Done"));
    assert!(!h.executor.is_running());

    let steps = h.executor.trigger_event(TriggerEvent::signal("finish")).unwrap();
    assert!(steps.is_empty());
}

#[test]
fn entering_final_child_raises_done_event() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("S")
                .state(StateBuilder::new("S1").transition(TransitionBuilder::on("finish").to("SF")))
                .state(StateBuilder::final_state("SF"))
                .transition(TransitionBuilder::on("done.state.S").to("Next")),
        )
        .state(StateBuilder::new("Next"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    let steps = h.executor.trigger_event(TriggerEvent::signal("finish")).unwrap();

    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1].event.as_deref(), Some("done.state.S"));
    assert_eq!(h.executor.active_ids(), vec!["Next"]);
}

#[test]
fn parallel_completes_when_every_region_is_done() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::parallel("P")
                .state(
                    StateBuilder::new("R1")
                        .state(StateBuilder::new("X").transition(TransitionBuilder::on("x").to("XF")))
                        .state(StateBuilder::final_state("XF")),
                )
                .state(
                    StateBuilder::new("R2")
                        .state(StateBuilder::new("Y").transition(TransitionBuilder::on("y").to("YF")))
                        .state(StateBuilder::final_state("YF")),
                )
                .transition(TransitionBuilder::on("done.state.P").to("End")),
        )
        .state(StateBuilder::new("End"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor.trigger_event(TriggerEvent::signal("x")).unwrap();
    assert!(h.executor.is_active("XF"));
    assert!(h.executor.is_active("P"));

    h.executor.trigger_event(TriggerEvent::signal("y")).unwrap();
    assert_eq!(h.executor.active_ids(), vec!["End"]);
}

#[test]
fn eventless_transitions_run_until_stable() {
    let document = DocumentBuilder::new()
        .data(Data::value("count", json!(0)))
        .state(
            StateBuilder::new("Loop")
                .transition(
                    TransitionBuilder::eventless()
                        .when("count < 3")
                        .action(Action::assign("count", "count + 1")),
                )
                .transition(TransitionBuilder::eventless().when("count == 3").to("Stop")),
        )
        .state(StateBuilder::new("Stop"))
        .build()
        .unwrap();
    let mut h = harness(document);

    let steps = h.executor.go().unwrap();
    assert_eq!(h.executor.active_ids(), vec!["Stop"]);
    assert_eq!(h.executor.value(None, "count"), Some(&json!(3)));
    // initial entry, three increments, the exit
    assert_eq!(steps.len(), 5);
}

#[test]
fn runaway_macrostep_is_stopped_at_the_ceiling() {
    let document = DocumentBuilder::new()
        .state(StateBuilder::new("Spin").transition(TransitionBuilder::eventless().to("Spin")))
        .build()
        .unwrap();
    let config = ExecutorConfig::builder().max_microsteps(10).build();
    let mut h = harness_with(Arc::new(document), config);

    let steps = h.executor.go().unwrap();
    assert_eq!(steps.len(), 11);
    assert_eq!(h.reporter.count(ErrorKind::LoopLimit), 1);
    assert!(!h.executor.is_running());
}

#[test]
fn failing_guard_is_reported_and_treated_as_false() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("A")
                .transition(TransitionBuilder::on("go").when("missing == 1").to("Wrong"))
                .transition(TransitionBuilder::on("go").to("Right")),
        )
        .state(StateBuilder::new("Wrong"))
        .state(StateBuilder::new("Right"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor.trigger_event(TriggerEvent::signal("go")).unwrap();

    assert_eq!(h.executor.active_ids(), vec!["Right"]);
    assert_eq!(h.reporter.count(ErrorKind::ExpressionError), 1);
    assert_eq!(h.executor.instance().pending_internal_events(), 0);
}

#[test]
fn assigning_undeclared_variable_raises_error_execution() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("A")
                .on_entry(Action::assign("nope", "1"))
                .on_entry(send("unreached"))
                .transition(TransitionBuilder::on("error.execution").to("Failed")),
        )
        .state(StateBuilder::new("Failed"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();

    assert_eq!(h.executor.active_ids(), vec!["Failed"]);
    assert_eq!(h.reporter.count(ErrorKind::UndefinedVariable), 1);
    assert!(h.dispatcher.events().is_empty());
}

#[test]
fn assigning_system_variable_is_rejected() {
    let document = DocumentBuilder::new()
        .state(StateBuilder::new("A").on_entry(Action::assign("_sessionid", "'forged'")))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert_eq!(h.reporter.count(ErrorKind::ExecutionError), 1);
    let session = h.executor.session_id().to_string();
    assert_eq!(h.executor.value(None, "_sessionid"), Some(&json!(session)));
}

#[test]
fn state_datamodel_is_scoped_to_the_state() {
    let document = DocumentBuilder::new()
        .data(Data::value("total", json!(10)))
        .state(
            StateBuilder::new("A")
                .data(Data::expr("local", "total + 5"))
                .transition(TransitionBuilder::on("bump").action(Action::assign("total", "local + 1"))),
        )
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert_eq!(h.executor.value(Some("A"), "local"), Some(&json!(15)));
    assert_eq!(h.executor.value(None, "local"), None);

    h.executor.trigger_event(TriggerEvent::signal("bump")).unwrap();
    assert_eq!(h.executor.value(None, "total"), Some(&json!(16)));
    assert_eq!(h.executor.active_ids(), vec!["A"]);
}

#[test]
fn event_data_is_visible_to_guards() {
    let document = DocumentBuilder::new()
        .data(Data::value("expected", json!({"name": "go", "type": "signal"})))
        .state(
            StateBuilder::new("A")
                .transition(TransitionBuilder::on("go").when("_event != expected").to("B"))
                .transition(TransitionBuilder::on("go").to("C")),
        )
        .state(StateBuilder::new("B"))
        .state(StateBuilder::new("C"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor
        .trigger_event(TriggerEvent::signal("go").with_data(json!({"n": 1})))
        .unwrap();
    assert_eq!(h.executor.active_ids(), vec!["B"]);
}

#[test]
fn in_predicate_sees_other_regions() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::parallel("P")
                .state(
                    StateBuilder::new("R1")
                        .state(StateBuilder::new("A1").transition(TransitionBuilder::on("a").to("A2")))
                        .state(StateBuilder::new("A2")),
                )
                .state(
                    StateBuilder::new("R2")
                        .state(StateBuilder::new("B1").transition(TransitionBuilder::on("b").when("In('A2')").to("B2")))
                        .state(StateBuilder::new("B2")),
                ),
        )
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor.trigger_event(TriggerEvent::signal("b")).unwrap();
    assert!(h.executor.is_active("B1"));

    h.executor
        .trigger_events(["a", "b"].map(TriggerEvent::signal))
        .unwrap();
    assert!(h.executor.is_active("B2"));
}

#[test]
fn raised_events_are_processed_in_order_before_returning() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("A")
                .transition(
                    TransitionBuilder::on("go")
                        .to("B")
                        .action(Action::raise("first"))
                        .action(Action::raise("second")),
                ),
        )
        .state(StateBuilder::new("B").transition(TransitionBuilder::on("first").to("C")))
        .state(
            StateBuilder::new("C")
                .transition(TransitionBuilder::on("second").to("D"))
                .transition(TransitionBuilder::on("first").to("Wrong")),
        )
        .state(StateBuilder::new("D"))
        .state(StateBuilder::new("Wrong"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    let steps = h.executor.trigger_event(TriggerEvent::signal("go")).unwrap();

    let events: Vec<_> = steps.iter().filter_map(|s| s.event.clone()).collect();
    assert_eq!(events, vec!["go", "first", "second"]);
    assert_eq!(h.executor.active_ids(), vec!["D"]);
}

#[test]
fn internal_send_goes_to_the_internal_queue() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("A")
                .on_entry(Action::send(SendAction::event("ping").to("#_internal")))
                .transition(TransitionBuilder::on("ping").to("B")),
        )
        .state(StateBuilder::new("B"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert_eq!(h.executor.active_ids(), vec!["B"]);
    assert!(h.dispatcher.events().is_empty());
}

#[test]
fn external_send_carries_namelist_and_params() {
    let document = DocumentBuilder::new()
        .data(Data::value("order", json!(42)))
        .state(
            StateBuilder::new("A").on_entry(Action::send(
                SendAction::event("placed")
                    .to("#_parent")
                    .name("order")
                    .param(harel::core::Param::expr("priority", "'high'")),
            )),
        )
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    let sent = h.dispatcher.sent.lock().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].target.as_deref(), Some("#_parent"));
    assert_eq!(sent[0].data, Some(json!({"order": 42, "priority": "high"})));
    assert!(sent[0].send_id.starts_with(&h.executor.session_id().to_string()));
}

#[test]
fn dispatch_failure_raises_error_communication() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("A")
                .on_entry(Action::send(SendAction::event("lost").to("#unreachable")))
                .transition(TransitionBuilder::on("error.communication").to("Offline")),
        )
        .state(StateBuilder::new("Offline"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert_eq!(h.executor.active_ids(), vec!["Offline"]);
    assert_eq!(h.reporter.count(ErrorKind::CommunicationError), 1);
}

#[test]
fn cancel_action_reaches_the_dispatcher() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("A")
                .on_entry(Action::send(SendAction::event("timeout").with_id("timer")))
                .on_exit(Action::cancel("timer"))
                .transition(TransitionBuilder::on("answer").to("B")),
        )
        .state(StateBuilder::new("B"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor.trigger_event(TriggerEvent::signal("answer")).unwrap();
    assert_eq!(h.dispatcher.cancelled.lock().clone(), vec!["timer"]);
}

#[test]
fn if_action_runs_first_matching_branch() {
    let document = DocumentBuilder::new()
        .data(Data::value("level", json!(2)))
        .state(StateBuilder::new("A").on_entry(Action::if_else(
            vec![
                harel::core::Branch {
                    cond: "level == 1".to_string(),
                    actions: vec![send("one")],
                },
                harel::core::Branch {
                    cond: "level == 2".to_string(),
                    actions: vec![send("two")],
                },
            ],
            vec![send("other")],
        )))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert_eq!(h.dispatcher.events(), vec!["two"]);
}

#[test]
fn invokes_start_after_the_macrostep_settles() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("Passing")
                .invoke(Invoke::new("worker").with_id("never"))
                .transition(TransitionBuilder::eventless().to("Working")),
        )
        .state(
            StateBuilder::new("Working")
                .invoke(Invoke::new("worker").with_id("job"))
                .transition(TransitionBuilder::on("stop").to("Done")),
        )
        .state(StateBuilder::new("Done"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert_eq!(h.invoker.started_ids(), vec!["job"]);
    assert_eq!(h.invoker.started.lock()[0].state, "Working");

    h.executor.trigger_event(TriggerEvent::signal("stop")).unwrap();
    assert_eq!(h.invoker.cancelled.lock().clone(), vec!["job"]);
}

#[test]
fn failed_invoke_raises_error_event() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("A")
                .invoke(Invoke::new("broken"))
                .transition(TransitionBuilder::on("error.execution").to("Failed")),
        )
        .state(StateBuilder::new("Failed"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    assert_eq!(h.reporter.count(ErrorKind::InvokerError), 1);
    assert_eq!(h.executor.active_ids(), vec!["Failed"]);
}

#[test]
fn cancel_event_stops_the_session() {
    let document = DocumentBuilder::new()
        .state(StateBuilder::new("A").transition(TransitionBuilder::on("go").to("B")))
        .state(StateBuilder::new("B"))
        .build()
        .unwrap();
    let mut h = harness(document);

    h.executor.go().unwrap();
    h.executor.trigger_event(TriggerEvent::cancel()).unwrap();
    assert!(!h.executor.is_running());

    let steps = h.executor.trigger_event(TriggerEvent::signal("go")).unwrap();
    assert!(steps.is_empty());
    assert_eq!(h.executor.active_ids(), vec!["A"]);

    h.executor.go().unwrap();
    h.executor.trigger_event(TriggerEvent::signal("go")).unwrap();
    assert_eq!(h.executor.active_ids(), vec!["B"]);
}

fn working_document() -> Document {
    DocumentBuilder::new()
        .state(
            StateBuilder::new("Working")
                .invoke(Invoke::new("worker").with_id("job"))
                .transition(TransitionBuilder::on("done").to("Idle")),
        )
        .state(StateBuilder::new("Idle"))
        .build()
        .unwrap()
}

#[test]
fn cancel_event_cancels_running_invokes() {
    let mut h = harness(working_document());

    h.executor.go().unwrap();
    assert_eq!(h.invoker.started_ids(), vec!["job"]);

    h.executor.trigger_event(TriggerEvent::cancel()).unwrap();
    assert!(!h.executor.is_running());
    assert_eq!(h.invoker.cancelled.lock().clone(), vec!["job"]);
}

#[test]
fn restarting_the_session_cancels_running_invokes() {
    let mut h = harness(working_document());

    h.executor.go().unwrap();
    h.executor.go().unwrap();

    assert_eq!(h.invoker.started_ids(), vec!["job", "job"]);
    assert_eq!(h.invoker.cancelled.lock().clone(), vec!["job"]);
    assert!(h.executor.is_running());
}

#[test]
fn fatal_legality_policy_runs_legal_documents() {
    let document = DocumentBuilder::new()
        .state(StateBuilder::new("A").transition(TransitionBuilder::on("go").to("B")))
        .state(StateBuilder::new("B"))
        .initial("A B")
        .build();

    // two top-level initial states are rejected up front
    assert!(document.is_err());

    let document = DocumentBuilder::new()
        .state(
            StateBuilder::parallel("P")
                .state(StateBuilder::new("R1"))
                .state(StateBuilder::new("R2")),
        )
        .build()
        .unwrap();
    let config = ExecutorConfig::builder().legality(LegalityPolicy::Fatal).build();
    let mut h = harness_with(Arc::new(document), config);

    h.executor.go().unwrap();
    assert!(h.executor.is_running());
    assert!(h.reporter.is_empty());
}

#[test]
fn loopback_dispatcher_feeds_the_external_queue() {
    let document = DocumentBuilder::new()
        .state(
            StateBuilder::new("A")
                .on_entry(Action::send(SendAction::event("wake")))
                .transition(TransitionBuilder::on("wake").to("B")),
        )
        .state(StateBuilder::new("B"))
        .build()
        .unwrap();
    let queue = EventQueue::new();
    let mut executor = ExecutorBuilder::new(Arc::new(document))
        .evaluator(ExprEvaluator)
        .dispatcher(LoopbackDispatcher::new(queue.clone()))
        .event_queue(queue.clone())
        .build()
        .unwrap();

    executor.go().unwrap();
    assert_eq!(executor.active_ids(), vec!["A"]);
    assert_eq!(queue.len(), 1);

    executor.process_pending().unwrap();
    assert_eq!(executor.active_ids(), vec!["B"]);
    assert!(queue.is_empty());
}

#[test]
fn executor_errors_are_displayable() {
    let err = ExecutorError::IllegalConfiguration("P is missing a region".to_string());
    assert!(err.to_string().contains("P is missing a region"));
}
