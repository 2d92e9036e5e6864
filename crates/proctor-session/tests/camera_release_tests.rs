//! Integration tests for camera release on every exit path.

mod common;

use common::Harness;
use proctor_core::Phase;
use proctor_device::SyntheticOutcome;
use proctor_guards::{FormFactor, Visibility};
use proctor_session::{CAMERA_REQUIRED_ALERT, CameraStatus};
use proctor_submit::{RecordingTransport, SubmitError};

fn released(harness: &Harness) -> bool {
    !harness.camera.stopped_tracks().is_empty()
}

#[test]
fn camera_release_tests_manual_submit_path() {
    let harness = Harness::desktop();
    let mut controller = harness.started(1);
    assert!(controller.camera_live());

    controller.submit(1_000).expect("submit");
    assert!(released(&harness));
    assert!(!controller.camera_live());
}

#[test]
fn camera_release_tests_violation_path() {
    let harness = Harness::desktop();
    let mut controller = harness.started(1);

    controller.on_visibility_change(Visibility::Hidden, 1_000);
    controller.on_visibility_change(Visibility::Hidden, 2_000);
    assert!(released(&harness));
}

#[test]
fn camera_release_tests_failed_submission_path() {
    let harness = Harness::build(
        FormFactor::Desktop,
        SyntheticOutcome::Grant { tracks: 2 },
        RecordingTransport::scripted([Err(SubmitError::Server(503))]),
    );
    let mut controller = harness.started(1);

    controller.submit(1_000).expect("submit");
    assert_eq!(controller.phase(), Phase::Failed);
    assert_eq!(harness.camera.stopped_tracks().len(), 2);
}

#[test]
fn camera_release_tests_abrupt_teardown_while_active() {
    let harness = Harness::desktop();
    let controller = harness.started(1);
    drop(controller);

    assert!(released(&harness));
    assert_eq!(harness.transport.call_count(), 0);
}

#[test]
fn camera_release_tests_abrupt_teardown_during_briefing() {
    let harness = Harness::desktop();
    let controller = harness.loaded(1);
    drop(controller);
    assert!(released(&harness));
}

#[test]
fn camera_release_tests_leave_while_active_submits_best_effort() {
    let harness = Harness::desktop();
    let mut controller = harness.started(2);

    controller.leave(4_000);
    assert!(released(&harness));
    let sent = harness.sent_requests();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].auto_submitted);
}

#[test]
fn camera_release_tests_leave_during_briefing_blocks_start() {
    let harness = Harness::desktop();
    let mut controller = harness.loaded(1);

    controller.leave(0);
    assert!(released(&harness));
    controller.start(1_000).expect("start after leave is ignored");
    assert_eq!(controller.phase(), Phase::Briefing);
}

#[test]
fn camera_release_tests_denied_camera_alerts_and_still_starts() {
    let harness = Harness::build(
        FormFactor::Desktop,
        SyntheticOutcome::Deny,
        RecordingTransport::new(),
    );
    let mut controller = harness.loaded(1);

    assert_eq!(controller.take_alerts(), vec![CAMERA_REQUIRED_ALERT.to_string()]);
    assert!(matches!(controller.snapshot().camera, CameraStatus::Failed(_)));

    controller.start(0).expect("camera is advisory");
    assert_eq!(controller.phase(), Phase::Active);
    controller.submit(1_000).expect("submit");
    assert_eq!(controller.phase(), Phase::Completed);
    assert!(harness.camera.stopped_tracks().is_empty());
}

#[test]
fn camera_release_tests_teardown_is_idempotent() {
    let harness = Harness::desktop();
    let mut controller = harness.started(1);

    controller.teardown();
    controller.teardown();
    drop(controller);
    assert_eq!(harness.camera.stopped_tracks().len(), 1);
}
