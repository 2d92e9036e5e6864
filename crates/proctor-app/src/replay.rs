//! Scripted replay of host events against synthetic providers.
//!
//! A replay script names the questions, the device class and how the camera
//! and submission endpoint behave, then lists host events with explicit
//! timestamps. Guard transitions go through the guards' subscription channels
//! exactly as a real host would deliver them.

use std::path::Path;
use std::sync::Arc;

use proctor_core::SubmissionRequest;
use proctor_device::{DeviceMonitor, SyntheticCamera, SyntheticOutcome};
use proctor_guards::{FormFactor, FullscreenGuard, SyntheticFullscreen, Visibility, VisibilityGuard};
use proctor_session::{InMemorySessionStore, Providers, SessionController, SessionSnapshot};
use proctor_submit::{RecordingTransport, SubmissionClient, SubmitError};
use proctor_ui::SessionView;
use serde::{Deserialize, Serialize};

use crate::config::ProctorConfig;
use crate::{AppError, app_version};

/// How the synthetic camera answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraScript {
    /// Grants one video track.
    #[default]
    Grant,
    /// Permission refused.
    Deny,
    /// No camera present.
    Unavailable,
}

impl CameraScript {
    fn outcome(self) -> SyntheticOutcome {
        match self {
            CameraScript::Grant => SyntheticOutcome::Grant { tracks: 1 },
            CameraScript::Deny => SyntheticOutcome::Deny,
            CameraScript::Unavailable => SyntheticOutcome::Unavailable,
        }
    }
}

/// Scripted answer of the submission endpoint, consumed one per call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScriptedSubmission {
    /// 2xx.
    Accept,
    /// Request timed out.
    Timeout,
    /// Connection failed.
    Connection {
        /// Failure detail.
        message: String,
    },
    /// 5xx.
    Server {
        /// HTTP status.
        status: u16,
    },
    /// 4xx.
    Client {
        /// HTTP status.
        status: u16,
    },
}

impl ScriptedSubmission {
    fn into_result(self) -> Result<(), SubmitError> {
        match self {
            ScriptedSubmission::Accept => Ok(()),
            ScriptedSubmission::Timeout => Err(SubmitError::Timeout),
            ScriptedSubmission::Connection { message } => Err(SubmitError::Connection(message)),
            ScriptedSubmission::Server { status } => Err(SubmitError::Server(status)),
            ScriptedSubmission::Client { status } => Err(SubmitError::Client(status)),
        }
    }
}

/// One host event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayEvent {
    /// Candidate presses "Start Interview".
    Start {
        /// Host time.
        at_ms: u64,
    },
    /// Candidate edits an answer.
    Answer {
        /// Question index.
        index: usize,
        /// Full answer text.
        text: String,
    },
    /// "Next" pressed.
    Next,
    /// "Previous" pressed.
    Previous,
    /// "Submit" pressed.
    Submit {
        /// Host time.
        at_ms: u64,
    },
    /// "Retry" pressed after a failed submission.
    Retry,
    /// Timer tick.
    Tick {
        /// Host time.
        at_ms: u64,
    },
    /// Fullscreen state changed.
    FullscreenChange {
        /// New state.
        fullscreen: bool,
        /// Host time.
        at_ms: u64,
    },
    /// Page visibility changed.
    VisibilityChange {
        /// `true` when the page became hidden.
        hidden: bool,
        /// Host time.
        at_ms: u64,
    },
    /// Warning acknowledged.
    DismissWarning,
    /// Host starts granting or refusing fullscreen requests.
    SetFullscreenGrant {
        /// Whether later requests succeed.
        grant: bool,
    },
    /// Hosting view discarded.
    Leave {
        /// Host time.
        at_ms: u64,
    },
}

impl ReplayEvent {
    /// Short name used in logs and rejection notes.
    pub fn name(&self) -> &'static str {
        match self {
            ReplayEvent::Start { .. } => "start",
            ReplayEvent::Answer { .. } => "answer",
            ReplayEvent::Next => "next",
            ReplayEvent::Previous => "previous",
            ReplayEvent::Submit { .. } => "submit",
            ReplayEvent::Retry => "retry",
            ReplayEvent::Tick { .. } => "tick",
            ReplayEvent::FullscreenChange { .. } => "fullscreen_change",
            ReplayEvent::VisibilityChange { .. } => "visibility_change",
            ReplayEvent::DismissWarning => "dismiss_warning",
            ReplayEvent::SetFullscreenGrant { .. } => "set_fullscreen_grant",
            ReplayEvent::Leave { .. } => "leave",
        }
    }
}

fn default_form_factor() -> FormFactor {
    FormFactor::Desktop
}

fn default_true() -> bool {
    true
}

/// Complete replay input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplayScript {
    /// Session identifier.
    pub session_id: String,
    /// Stored questions.
    pub questions: Vec<String>,
    /// Device class.
    #[serde(default = "default_form_factor")]
    pub form_factor: FormFactor,
    /// Camera behavior.
    #[serde(default)]
    pub camera: CameraScript,
    /// Whether the first fullscreen request is granted.
    #[serde(default = "default_true")]
    pub fullscreen_granted: bool,
    /// Endpoint answers; calls beyond the list are accepted.
    #[serde(default)]
    pub submissions: Vec<ScriptedSubmission>,
    /// Host events in delivery order.
    pub events: Vec<ReplayEvent>,
}

impl ReplayScript {
    /// Parses a script from JSON.
    ///
    /// # Errors
    /// Returns [`AppError::Decode`] for malformed input.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads and parses a script file.
    ///
    /// # Errors
    /// Returns [`AppError::Io`] when the file cannot be read and
    /// [`AppError::Decode`] for malformed input.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}

/// Outcome of one replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Final controller state.
    pub snapshot: SessionSnapshot,
    /// Every submission body sent, in order.
    pub submissions: Vec<SubmissionRequest>,
    /// Idempotency key of each submission.
    pub idempotency_keys: Vec<String>,
    /// Warnings and alerts surfaced to the candidate.
    pub alerts: Vec<String>,
    /// Host actions the controller refused, as `step <n> <event>: <reason>`.
    pub rejected: Vec<String>,
    /// Whether the camera was still held after the last event.
    pub camera_live: bool,
    /// Camera tracks stopped by the end of the run, teardown included.
    pub camera_tracks_stopped: usize,
    /// Final view, for status projection.
    #[serde(skip)]
    pub view: SessionView,
}

/// Runs a script to completion and tears the controller down.
///
/// # Errors
/// Returns [`AppError::Submit`] for a rejected base URL, [`AppError::Policy`]
/// for an invalid threshold and [`AppError::Session`] when the questions
/// cannot be loaded.
pub fn run_replay(script: &ReplayScript, config: &ProctorConfig) -> Result<ReplayReport, AppError> {
    let camera = Arc::new(SyntheticCamera::with_outcome(script.camera.outcome()));
    let fullscreen_host = Arc::new(SyntheticFullscreen::new(script.fullscreen_granted));
    let fullscreen = Arc::new(FullscreenGuard::new(
        fullscreen_host.clone(),
        script.form_factor,
    ));
    let visibility = Arc::new(VisibilityGuard::new());
    let transport = Arc::new(RecordingTransport::scripted(
        script
            .submissions
            .iter()
            .cloned()
            .map(ScriptedSubmission::into_result),
    ));
    let store = Arc::new(InMemorySessionStore::new());
    store.insert(script.session_id.clone(), script.questions.clone());

    let providers = Providers {
        camera: DeviceMonitor::new(camera.clone()),
        fullscreen: fullscreen.clone(),
        visibility: visibility.clone(),
        submitter: SubmissionClient::new(&config.submit_base_url, transport.clone())?,
        store,
    };

    let mut controller =
        SessionController::new(script.session_id.clone(), config.session_config()?, providers);
    controller.load()?;

    let mut alerts = Vec::new();
    let mut rejected = Vec::new();
    for (step, event) in script.events.iter().enumerate() {
        tracing::debug!(step, event = event.name(), "replaying host event");
        let outcome = match event {
            ReplayEvent::Start { at_ms } => controller.start(*at_ms),
            ReplayEvent::Answer { index, text } => controller.set_answer(*index, text.clone()),
            ReplayEvent::Next => {
                controller.next();
                Ok(())
            }
            ReplayEvent::Previous => {
                controller.previous();
                Ok(())
            }
            ReplayEvent::Submit { at_ms } => controller.submit(*at_ms).map(|_| ()),
            ReplayEvent::Retry => {
                controller.retry();
                Ok(())
            }
            ReplayEvent::Tick { at_ms } => {
                controller.tick(*at_ms);
                Ok(())
            }
            ReplayEvent::FullscreenChange {
                fullscreen: is_fullscreen,
                at_ms,
            } => {
                if !is_fullscreen {
                    fullscreen_host.force_exit();
                }
                fullscreen.notify(*is_fullscreen);
                controller.poll_guards(*at_ms);
                Ok(())
            }
            ReplayEvent::VisibilityChange { hidden, at_ms } => {
                visibility.notify(if *hidden {
                    Visibility::Hidden
                } else {
                    Visibility::Visible
                });
                controller.poll_guards(*at_ms);
                Ok(())
            }
            ReplayEvent::DismissWarning => {
                controller.dismiss_warning();
                Ok(())
            }
            ReplayEvent::SetFullscreenGrant { grant } => {
                fullscreen_host.set_grant(*grant);
                Ok(())
            }
            ReplayEvent::Leave { at_ms } => {
                controller.leave(*at_ms);
                Ok(())
            }
        };
        if let Err(error) = outcome {
            rejected.push(format!("step {step} {}: {error}", event.name()));
        }
        alerts.extend(controller.take_alerts());
    }

    let snapshot = controller.snapshot();
    let view = SessionView::project(
        app_version(),
        &snapshot,
        controller.session(),
        script.form_factor,
    );
    let camera_live = controller.camera_live();
    controller.teardown();

    let sent = transport.sent();
    let submissions = sent
        .iter()
        .map(|envelope| SubmissionRequest::from_json_bytes(&envelope.body))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| AppError::Submit(SubmitError::Encode(error)))?;

    tracing::info!(
        session_id = %snapshot.session_id,
        phase = ?snapshot.phase,
        submissions = submissions.len(),
        rejected = rejected.len(),
        "replay finished"
    );

    Ok(ReplayReport {
        snapshot,
        submissions,
        idempotency_keys: sent
            .into_iter()
            .map(|envelope| envelope.idempotency_key)
            .collect(),
        alerts,
        rejected,
        camera_live,
        camera_tracks_stopped: camera.stopped_tracks().len(),
        view,
    })
}
