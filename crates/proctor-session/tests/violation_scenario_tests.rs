//! Integration tests for violation escalation through the guards.

mod common;

use common::Harness;
use proctor_core::{Phase, VIOLATION_REASON_TEXT};
use proctor_guards::{FullscreenApi, Visibility};
use proctor_policy::{DEFAULT_FULLSCREEN_WARNING, DEFAULT_TAB_WARNING, EscalationPolicy};
use proctor_session::{SessionConfig, SessionController};

#[test]
fn violation_scenario_tests_two_tab_hides_auto_submit() {
    let harness = Harness::desktop();
    let mut controller = harness.started(2);
    controller.set_answer(0, "partial").expect("valid index");

    harness.visibility.notify(Visibility::Hidden);
    controller.poll_guards(5_000);
    assert_eq!(controller.phase(), Phase::Active);
    assert_eq!(controller.take_alerts(), vec![DEFAULT_TAB_WARNING.to_string()]);

    harness.visibility.notify(Visibility::Visible);
    harness.visibility.notify(Visibility::Hidden);
    controller.poll_guards(9_000);

    assert_eq!(controller.phase(), Phase::Completed);
    let sent = harness.sent_requests();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].auto_submitted);
    assert_eq!(sent[0].reason.as_deref(), Some(VIOLATION_REASON_TEXT));
    assert!(sent[0].reason.as_deref().is_some_and(|reason| reason.contains("violations")));
    assert_eq!(sent[0].answers, vec!["partial", ""]);

    harness.visibility.notify(Visibility::Hidden);
    controller.poll_guards(10_000);
    controller.on_visibility_change(Visibility::Hidden, 10_000);
    assert_eq!(controller.snapshot().violation_count, 2);
    assert_eq!(harness.transport.call_count(), 1);
    assert!(!controller.monitoring_live());
}

#[test]
fn violation_scenario_tests_fullscreen_exit_warns_and_reenters() {
    let harness = Harness::desktop();
    let mut controller = harness.started(2);
    let requests_at_start = harness.fullscreen_host.request_count();

    harness.fullscreen_host.force_exit();
    harness.fullscreen.notify(false);
    controller.poll_guards(20_000);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Active);
    assert_eq!(snapshot.violation_count, 1);
    assert_eq!(snapshot.warning.as_deref(), Some(DEFAULT_FULLSCREEN_WARNING));

    controller.tick(21_000);
    assert_eq!(harness.fullscreen_host.request_count(), requests_at_start);
    controller.tick(23_000);
    assert_eq!(harness.fullscreen_host.request_count(), requests_at_start + 1);
    assert!(harness.fullscreen_host.is_fullscreen());

    harness.fullscreen.notify(true);
    controller.poll_guards(23_000);
    assert_eq!(controller.snapshot().violation_count, 1);
    assert_eq!(controller.phase(), Phase::Active);

    controller.dismiss_warning();
    assert_eq!(controller.snapshot().warning, None);
}

#[test]
fn violation_scenario_tests_mixed_kinds_terminate_equally_fast() {
    let harness = Harness::desktop();
    let mut controller = harness.started(1);

    controller.on_fullscreen_change(false, 1_000);
    controller.on_visibility_change(Visibility::Hidden, 1_001);

    assert_eq!(controller.phase(), Phase::Completed);
    assert_eq!(harness.transport.call_count(), 1);
}

#[test]
fn violation_scenario_tests_events_before_start_do_not_count() {
    let harness = Harness::desktop();
    let mut controller = harness.loaded(1);

    controller.on_visibility_change(Visibility::Hidden, 0);
    controller.on_fullscreen_change(false, 0);
    assert_eq!(controller.snapshot().violation_count, 0);
    assert_eq!(controller.phase(), Phase::Briefing);
}

#[test]
fn violation_scenario_tests_mobile_ignores_fullscreen_but_counts_app_switch() {
    let harness = Harness::mobile();
    let mut controller = harness.started(1);
    assert_eq!(harness.fullscreen_host.request_count(), 0);

    harness.fullscreen.notify(false);
    controller.poll_guards(1_000);
    assert_eq!(controller.snapshot().violation_count, 0);

    controller.on_visibility_change(Visibility::Hidden, 2_000);
    assert_eq!(controller.snapshot().violation_count, 1);
}

#[test]
fn violation_scenario_tests_counts_guards_in_delivery_order() {
    let harness = Harness::desktop();
    harness
        .store
        .insert(common::SESSION_ID, vec!["only".to_string()]);
    let config = SessionConfig {
        policy: EscalationPolicy::with_threshold(3).expect("threshold"),
        ..SessionConfig::default()
    };
    let mut controller = SessionController::new(common::SESSION_ID, config, harness.providers());
    controller.load().expect("load");
    controller.start(0).expect("start");

    harness.visibility.notify(Visibility::Hidden);
    harness.fullscreen_host.force_exit();
    harness.fullscreen.notify(false);
    controller.poll_guards(1_000);

    assert_eq!(
        controller.take_alerts(),
        vec![
            DEFAULT_TAB_WARNING.to_string(),
            DEFAULT_FULLSCREEN_WARNING.to_string()
        ]
    );
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.violation_count, 2);
    assert_eq!(snapshot.warning.as_deref(), Some(DEFAULT_FULLSCREEN_WARNING));
    assert_eq!(snapshot.phase, Phase::Active);
}

#[test]
fn violation_scenario_tests_hide_before_exit_leaves_tab_warning_at_threshold_two() {
    let harness = Harness::desktop();
    let mut controller = harness.started(2);

    harness.visibility.notify(Visibility::Hidden);
    harness.fullscreen_host.force_exit();
    harness.fullscreen.notify(false);
    harness.visibility.notify(Visibility::Hidden);
    controller.poll_guards(1_000);

    assert_eq!(controller.take_alerts(), vec![DEFAULT_TAB_WARNING.to_string()]);
    assert_eq!(controller.phase(), Phase::Completed);
    assert_eq!(controller.snapshot().violation_count, 2);
    assert_eq!(harness.transport.call_count(), 1);
}
