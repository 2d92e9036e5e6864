#![warn(missing_docs)]
//! # proctor-app
//!
//! ## Purpose
//! Wires the interview session controller to its host environment: runtime
//! configuration, logging, on-disk question storage and a scripted replay
//! driver.
//!
//! ## Responsibilities
//! - Read [`ProctorConfig`] from `PROCTOR_*` environment variables.
//! - Install the global `tracing` subscriber in human or JSON format.
//! - Persist questions per session in [`FileSessionStore`].
//! - Replay recorded host events against synthetic providers ([`run_replay`]).
//! - Project the session view into a flat [`RuntimeStatus`].
//!
//! ## Data flow
//! Environment -> config -> providers + controller -> host events -> view ->
//! runtime status.
//!
//! ## Ownership and lifetimes
//! The replay driver owns its controller for the duration of one script and
//! returns an owned [`ReplayReport`]; nothing outlives the call.
//!
//! ## Error model
//! Startup failures (config, logging, script decode, storage) are wrapped in
//! [`AppError`]. Rejected host actions during replay are recorded in the
//! report rather than aborting the run.
//!
//! ## Security and privacy notes
//! - The submission base URL must be HTTPS unless it targets loopback.
//! - `PROCTOR_MONITORING_ENABLED=0` disables integrity monitoring without
//!   touching submission behavior.
//! - Logs never include question or answer text.

mod config;
mod logging;
mod replay;
mod store;

pub use config::{ProctorConfig, monitoring_enabled_from_env};
pub use logging::{LogFormat, init_logging};
pub use replay::{
    CameraScript, ReplayEvent, ReplayReport, ReplayScript, ScriptedSubmission, run_replay,
};
pub use store::FileSessionStore;

use proctor_ui::SessionView;
use thiserror::Error;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("PROCTOR_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Flat runtime status for status bars and log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStatus {
    /// Phase name.
    pub phase: String,
    /// Whether integrity monitoring is switched on for this process.
    pub monitoring_enabled: bool,
    /// Camera stage.
    pub camera: String,
    /// Submission stage.
    pub submission: String,
    /// `MM:SS` timer.
    pub timer: String,
    /// `k/threshold` badge, empty when no violation was counted.
    pub violations: String,
}

/// Projects the session view into a flat status snapshot.
///
/// Monitoring state comes from the view, so the status reflects the
/// configuration the session actually ran with.
pub fn project_runtime_status(view: &SessionView) -> RuntimeStatus {
    RuntimeStatus {
        phase: format!("{:?}", view.phase),
        monitoring_enabled: view.monitoring_enabled,
        camera: format!("{:?}", view.camera),
        submission: format!("{:?}", view.submission),
        timer: view.timer_text.clone(),
        violations: view.violation_badge.clone().unwrap_or_default(),
    }
}

/// Milliseconds since the Unix epoch, saturating at zero for clocks set
/// before 1970.
pub fn unix_timestamp_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Environment configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
    /// Global subscriber could not be installed.
    #[error("logging error: {0}")]
    Logging(String),
    /// Replay script could not be read.
    #[error("replay script io failure: {0}")]
    Io(#[from] std::io::Error),
    /// Replay script is not valid JSON.
    #[error("replay script decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Escalation policy is invalid.
    #[error("policy error: {0}")]
    Policy(#[from] proctor_policy::PolicyError),
    /// Submission endpoint is invalid.
    #[error("submit error: {0}")]
    Submit(#[from] proctor_submit::SubmitError),
    /// Session controller refused to load.
    #[error("session error: {0}")]
    Session(#[from] proctor_session::SessionError),
}
