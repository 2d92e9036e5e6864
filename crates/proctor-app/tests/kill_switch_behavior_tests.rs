//! Integration tests for the monitoring kill switch.

mod common;

use proctor_app::{ProctorConfig, monitoring_enabled_from_env, run_replay};

#[test]
fn kill_switch_behavior_tests_disables_monitoring_when_env_is_false() {
    // Safety:
    // - Integration tests mutate process env in a single-threaded test body.
    // - We reset the variable before returning.
    unsafe { std::env::set_var("PROCTOR_MONITORING_ENABLED", "false") };
    assert!(!monitoring_enabled_from_env());
    let config = ProctorConfig::from_env().expect("config");
    assert!(!config.monitoring_enabled);

    let script = common::script_with_events(
        2,
        r#"[
            {"type":"start","at_ms":0},
            {"type":"visibility_change","hidden":true,"at_ms":1000},
            {"type":"visibility_change","hidden":true,"at_ms":2000},
            {"type":"fullscreen_change","fullscreen":false,"at_ms":3000}
        ]"#,
    );
    let report = run_replay(&script, &config).expect("replay");
    assert_eq!(report.snapshot.violation_count, 0);
    assert!(report.submissions.is_empty());

    // Safety: see rationale above.
    unsafe { std::env::set_var("PROCTOR_MONITORING_ENABLED", "yes") };
    assert!(monitoring_enabled_from_env());

    // Safety: see rationale above.
    unsafe { std::env::remove_var("PROCTOR_MONITORING_ENABLED") };
    assert!(monitoring_enabled_from_env());
}
