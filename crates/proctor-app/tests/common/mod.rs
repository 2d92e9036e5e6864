//! Shared fixtures for app integration tests.

use proctor_app::{ProctorConfig, ReplayScript};

/// Session id used by every fixture script.
#[allow(dead_code)]
pub const SESSION_ID: &str = "session-xyz";

/// Default configuration without touching the process environment.
#[allow(dead_code)]
pub fn fixture_config() -> ProctorConfig {
    ProctorConfig::from_lookup(|_| None).expect("default config should be valid")
}

/// Parses a script whose `events` array is given as raw JSON.
#[allow(dead_code)]
pub fn script_with_events(question_count: usize, events_json: &str) -> ReplayScript {
    let questions: Vec<String> = (0..question_count)
        .map(|index| format!("Problem {index}"))
        .collect();
    let raw = format!(
        r#"{{"session_id":"{SESSION_ID}","questions":{},"events":{events_json}}}"#,
        serde_json::to_string(&questions).expect("questions encode")
    );
    ReplayScript::from_json(&raw).expect("fixture script should parse")
}
