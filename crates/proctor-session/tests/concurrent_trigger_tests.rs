//! Integration tests for simultaneous submission triggers.

mod common;

use common::Harness;
use proctor_core::{Phase, ViolationKind};
use proctor_guards::Visibility;
use proctor_session::{Effect, Event, SessionConfig, SessionMachine};

fn active_machine() -> SessionMachine {
    let mut machine = SessionMachine::new("session-race", SessionConfig::default());
    machine
        .handle(Event::Load {
            questions: Some(vec!["only question".to_string()]),
        })
        .expect("load");
    machine
        .handle(Event::Start {
            fullscreen_ok: true,
            now_ms: 0,
        })
        .expect("start");
    machine
        .handle(Event::Violation {
            kind: ViolationKind::TabHidden,
            now_ms: 100,
        })
        .expect("first strike");
    machine
}

fn count_submits(batches: &[Vec<Effect>]) -> usize {
    batches
        .iter()
        .flatten()
        .filter(|effect| matches!(effect, Effect::Submit(_)))
        .count()
}

#[test]
fn concurrent_trigger_tests_submit_first_while_in_flight() {
    let mut machine = active_machine();
    let batches = vec![
        machine
            .handle(Event::SubmitRequested { now_ms: 1_000 })
            .expect("submit"),
        machine
            .handle(Event::Violation {
                kind: ViolationKind::FullscreenExit,
                now_ms: 1_000,
            })
            .expect("violation"),
        machine.handle(Event::Tick { now_ms: 1_000 }).expect("tick"),
    ];

    assert_eq!(count_submits(&batches), 1);
    assert_eq!(machine.phase(), Phase::Submitting);
    let pending = machine.pending_submission().expect("payload frozen");
    assert!(!pending.auto_submitted);
}

#[test]
fn concurrent_trigger_tests_violation_first_while_in_flight() {
    let mut machine = active_machine();
    let batches = vec![
        machine
            .handle(Event::Violation {
                kind: ViolationKind::FullscreenExit,
                now_ms: 1_000,
            })
            .expect("violation"),
        machine
            .handle(Event::SubmitRequested { now_ms: 1_000 })
            .expect("submit"),
        machine.handle(Event::Leave { now_ms: 1_000 }).expect("leave"),
    ];

    assert_eq!(count_submits(&batches), 1);
    let pending = machine.pending_submission().expect("payload frozen");
    assert!(pending.auto_submitted);
}

#[test]
fn concurrent_trigger_tests_controller_sends_once_in_either_order() {
    for submit_first in [true, false] {
        let harness = Harness::desktop();
        let mut controller = harness.started(1);
        controller.on_visibility_change(Visibility::Hidden, 100);

        if submit_first {
            controller.submit(1_000).expect("submit");
            controller.on_visibility_change(Visibility::Hidden, 1_000);
        } else {
            controller.on_visibility_change(Visibility::Hidden, 1_000);
            controller.submit(1_000).expect("second trigger is a no-op");
        }

        assert_eq!(controller.phase(), Phase::Completed);
        assert_eq!(harness.transport.call_count(), 1);
    }
}
