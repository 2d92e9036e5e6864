//! Pure interview phase machine.

use proctor_core::{
    CoreError, ElapsedClock, Phase, Session, SubmissionRequest, TerminationReason, ViolationKind,
};
use proctor_policy::{EscalationDecision, EscalationPolicy, ViolationTracker};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Delay before re-entering fullscreen after an accidental exit.
pub const DEFAULT_REENTRY_DELAY_MS: u64 = 3_000;

/// Alert shown when the camera cannot be opened.
pub const CAMERA_REQUIRED_ALERT: &str = "Camera access is required. Please enable it and refresh.";

/// Alert shown when a submission attempt fails.
pub const SUBMISSION_FAILED_ALERT: &str = "Failed to submit interview";

/// Per-session tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Escalation threshold and warning texts.
    pub policy: EscalationPolicy,
    /// Delay before the automatic fullscreen re-entry.
    pub reentry_delay_ms: u64,
    /// When `false`, guards are never armed (kill switch).
    pub monitoring_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            policy: EscalationPolicy::default(),
            reentry_delay_ms: DEFAULT_REENTRY_DELAY_MS,
            monitoring_enabled: true,
        }
    }
}

/// Camera acquisition state as seen by the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "detail")]
pub enum CameraStatus {
    /// Acquisition not requested yet.
    NotRequested,
    /// Acquisition in flight.
    Acquiring,
    /// Stream live.
    Live,
    /// Acquisition failed; monitoring is advisory so the interview continues.
    Failed(String),
    /// Stream released.
    Released,
}

/// Inputs delivered one at a time to [`SessionMachine::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Question source answered. `None` means nothing is stored for the session.
    Load {
        /// Stored questions.
        questions: Option<Vec<String>>,
    },
    /// Camera acquisition finished with a stream.
    CameraAcquired,
    /// Camera acquisition failed.
    CameraFailed {
        /// Display-safe failure text.
        message: String,
    },
    /// Candidate pressed start; `fullscreen_ok` is the outcome of the entry
    /// attempt (always `true` where fullscreen is not required).
    Start {
        /// Whether the start precondition on fullscreen holds.
        fullscreen_ok: bool,
        /// Event time.
        now_ms: u64,
    },
    /// Candidate edited an answer slot.
    Answer {
        /// Slot index.
        index: usize,
        /// New text.
        text: String,
    },
    /// Move to the next question.
    Next,
    /// Move to the previous question.
    Previous,
    /// Guard reported an integrity violation.
    Violation {
        /// Violation kind.
        kind: ViolationKind,
        /// Event time.
        now_ms: u64,
    },
    /// Candidate pressed submit.
    SubmitRequested {
        /// Event time.
        now_ms: u64,
    },
    /// Hosting view is being discarded.
    Leave {
        /// Event time.
        now_ms: u64,
    },
    /// One-second timer tick.
    Tick {
        /// Event time.
        now_ms: u64,
    },
    /// Candidate acknowledged the warning.
    DismissWarning,
    /// Submission endpoint accepted the request.
    SubmissionSucceeded,
    /// Submission endpoint call failed.
    SubmissionFailed {
        /// Whether retrying may help.
        retriable: bool,
        /// Display-safe failure text.
        message: String,
    },
    /// Candidate asked to resend after a failure.
    Retry,
}

/// Side effects requested by the machine, executed in order by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the camera stream.
    AcquireCamera,
    /// Stop every camera track.
    ReleaseCamera,
    /// Arm guards and subscribe to their transitions.
    StartMonitoring,
    /// Disarm guards and drop their subscriptions.
    StopMonitoring,
    /// Leave fullscreen if active.
    ExitFullscreen,
    /// Best-effort fullscreen re-entry after an accidental exit.
    ReenterFullscreen,
    /// Surface a violation warning.
    ShowWarning(String),
    /// Surface a blocking alert.
    Alert(String),
    /// Send the submission request.
    Submit(SubmissionRequest),
    /// Clear locally cached question/answer state.
    ClearCachedSession,
}

/// Display-safe view of the machine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub session_id: String,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Current question pointer.
    pub current_index: usize,
    /// Number of questions, zero while idle.
    pub question_count: usize,
    /// Whole seconds on the interview timer.
    pub elapsed_seconds: u64,
    /// Violations counted.
    pub violation_count: u32,
    /// Count that terminates the interview.
    pub violation_threshold: u32,
    /// Warning waiting for acknowledgement.
    pub warning: Option<String>,
    /// Why the active phase ended.
    pub termination_reason: Option<TerminationReason>,
    /// Camera state.
    pub camera: CameraStatus,
    /// Submission calls issued so far.
    pub submission_attempts: u32,
    /// Whether the last failure may succeed on retry.
    pub last_failure_retriable: Option<bool>,
    /// Whether integrity monitoring runs for this session.
    pub monitoring_enabled: bool,
}

/// Pure interview phase machine.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    session_id: String,
    config: SessionConfig,
    phase: Phase,
    session: Option<Session>,
    tracker: ViolationTracker,
    clock: ElapsedClock,
    clock_now_ms: u64,
    camera: CameraStatus,
    warning: Option<String>,
    reentry_due_ms: Option<u64>,
    reason: Option<TerminationReason>,
    pending: Option<SubmissionRequest>,
    attempts: u32,
    last_failure_retriable: Option<bool>,
    closed: bool,
}

impl SessionMachine {
    /// Creates an idle machine for a session id.
    pub fn new(session_id: impl Into<String>, config: SessionConfig) -> Self {
        let tracker = ViolationTracker::new(config.policy.clone());
        Self {
            session_id: session_id.into(),
            config,
            phase: Phase::Idle,
            session: None,
            tracker,
            clock: ElapsedClock::new(),
            clock_now_ms: 0,
            camera: CameraStatus::NotRequested,
            warning: None,
            reentry_due_ms: None,
            reason: None,
            pending: None,
            attempts: 0,
            last_failure_retriable: None,
            closed: false,
        }
    }

    /// Session identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Loaded session, `None` while idle.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Violations counted so far.
    pub fn violation_count(&self) -> u32 {
        self.tracker.count()
    }

    /// Payload frozen when the session left `Active`.
    pub fn pending_submission(&self) -> Option<&SubmissionRequest> {
        self.pending.as_ref()
    }

    /// Returns `true` after the hosting view was discarded.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Builds a display-safe snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        let (current_index, question_count) = self
            .session
            .as_ref()
            .map_or((0, 0), |session| (session.current_index(), session.len()));

        SessionSnapshot {
            session_id: self.session_id.clone(),
            phase: self.phase,
            current_index,
            question_count,
            elapsed_seconds: self.clock.elapsed_seconds(self.clock_now_ms),
            violation_count: self.tracker.count(),
            violation_threshold: self.tracker.threshold(),
            warning: self.warning.clone(),
            termination_reason: self.reason,
            camera: self.camera.clone(),
            submission_attempts: self.attempts,
            last_failure_retriable: self.last_failure_retriable,
            monitoring_enabled: self.config.monitoring_enabled,
        }
    }

    /// Applies one event and returns the effects to execute, in order.
    ///
    /// # Errors
    /// Returns [`SessionError`] for precondition failures and programmer
    /// errors; the machine state is unchanged in that case. Superseded events
    /// (a violation after submission began, a second submit) return `Ok` with
    /// no effects.
    pub fn handle(&mut self, event: Event) -> Result<Vec<Effect>, SessionError> {
        if self.closed
            && !matches!(
                event,
                Event::SubmissionSucceeded | Event::SubmissionFailed { .. } | Event::CameraAcquired
            )
        {
            return Ok(Vec::new());
        }

        match event {
            Event::Load { questions } => self.on_load(questions),
            Event::CameraAcquired => Ok(self.on_camera_acquired()),
            Event::CameraFailed { message } => Ok(self.on_camera_failed(message)),
            Event::Start {
                fullscreen_ok,
                now_ms,
            } => self.on_start(fullscreen_ok, now_ms),
            Event::Answer { index, text } => self.on_answer(index, text),
            Event::Next => Ok(self.on_navigate(Session::next)),
            Event::Previous => Ok(self.on_navigate(Session::previous)),
            Event::Violation { kind, now_ms } => Ok(self.on_violation(kind, now_ms)),
            Event::SubmitRequested { now_ms } => self.on_submit_requested(now_ms),
            Event::Leave { now_ms } => Ok(self.on_leave(now_ms)),
            Event::Tick { now_ms } => Ok(self.on_tick(now_ms)),
            Event::DismissWarning => Ok(self.on_dismiss_warning()),
            Event::SubmissionSucceeded => Ok(self.on_submission_succeeded()),
            Event::SubmissionFailed { retriable, message } => {
                Ok(self.on_submission_failed(retriable, message))
            }
            Event::Retry => Ok(self.on_retry()),
        }
    }

    fn on_load(&mut self, questions: Option<Vec<String>>) -> Result<Vec<Effect>, SessionError> {
        if self.phase != Phase::Idle {
            return Err(SessionError::InvalidPhase {
                operation: "load",
                phase: self.phase,
            });
        }

        let questions = questions
            .filter(|questions| !questions.is_empty())
            .ok_or(SessionError::QuestionsUnavailable)?;
        self.session = Some(Session::new(self.session_id.clone(), questions)?);
        self.phase = Phase::Briefing;

        let mut effects = Vec::new();
        if self.camera == CameraStatus::NotRequested {
            self.camera = CameraStatus::Acquiring;
            effects.push(Effect::AcquireCamera);
        }
        Ok(effects)
    }

    fn on_camera_acquired(&mut self) -> Vec<Effect> {
        if self.closed || self.phase.has_left_active() || self.camera != CameraStatus::Acquiring {
            // Late stream: nothing may hold it anymore.
            self.camera = CameraStatus::Released;
            return vec![Effect::ReleaseCamera];
        }
        self.camera = CameraStatus::Live;
        Vec::new()
    }

    fn on_camera_failed(&mut self, message: String) -> Vec<Effect> {
        if self.camera != CameraStatus::Acquiring {
            return Vec::new();
        }
        self.camera = CameraStatus::Failed(message);
        vec![Effect::Alert(CAMERA_REQUIRED_ALERT.to_string())]
    }

    fn on_start(&mut self, fullscreen_ok: bool, now_ms: u64) -> Result<Vec<Effect>, SessionError> {
        match self.phase {
            Phase::Idle => Err(SessionError::QuestionsUnavailable),
            Phase::Briefing if !fullscreen_ok => Err(SessionError::FullscreenRequired),
            Phase::Briefing => {
                self.clock.start(now_ms);
                self.clock_now_ms = now_ms;
                self.phase = Phase::Active;
                let mut effects = Vec::new();
                if self.config.monitoring_enabled {
                    effects.push(Effect::StartMonitoring);
                }
                Ok(effects)
            }
            Phase::Active | Phase::Submitting | Phase::Completed | Phase::Failed => Ok(Vec::new()),
        }
    }

    fn on_answer(&mut self, index: usize, text: String) -> Result<Vec<Effect>, SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::NotEditable(self.phase));
        }
        if let Some(session) = self.session.as_mut() {
            session.set_answer(index, text)?;
        }
        Ok(Vec::new())
    }

    fn on_navigate(&mut self, step: fn(&mut Session) -> bool) -> Vec<Effect> {
        if self.phase == Phase::Active
            && let Some(session) = self.session.as_mut()
        {
            step(session);
        }
        Vec::new()
    }

    fn on_violation(&mut self, kind: ViolationKind, now_ms: u64) -> Vec<Effect> {
        if self.phase != Phase::Active {
            return Vec::new();
        }
        self.advance_clock(now_ms);

        match self.tracker.record(kind) {
            EscalationDecision::Warn { count, message, .. } => {
                tracing::warn!(
                    session_id = %self.session_id,
                    kind = kind.as_str(),
                    violation_count = count,
                    "integrity violation; warning issued"
                );
                if kind == ViolationKind::FullscreenExit {
                    self.reentry_due_ms = Some(now_ms.saturating_add(self.config.reentry_delay_ms));
                }
                self.warning = Some(message.clone());
                vec![Effect::ShowWarning(message)]
            }
            EscalationDecision::Terminate { count, .. } => {
                tracing::warn!(
                    session_id = %self.session_id,
                    kind = kind.as_str(),
                    violation_count = count,
                    "violation threshold reached; terminating interview"
                );
                self.begin_submission(TerminationReason::TimeoutViolations, now_ms)
            }
            EscalationDecision::Ignored => Vec::new(),
        }
    }

    fn on_submit_requested(&mut self, now_ms: u64) -> Result<Vec<Effect>, SessionError> {
        match self.phase {
            Phase::Idle | Phase::Briefing => Err(SessionError::InvalidPhase {
                operation: "submit",
                phase: self.phase,
            }),
            Phase::Active => {
                let on_last = self
                    .session
                    .as_ref()
                    .is_some_and(Session::is_last_question);
                if !on_last {
                    return Err(SessionError::NotOnLastQuestion);
                }
                Ok(self.begin_submission(TerminationReason::Manual, now_ms))
            }
            Phase::Submitting | Phase::Completed | Phase::Failed => Ok(Vec::new()),
        }
    }

    fn on_leave(&mut self, now_ms: u64) -> Vec<Effect> {
        let effects = match self.phase {
            Phase::Active => self.begin_submission(TerminationReason::NavigationAway, now_ms),
            Phase::Idle | Phase::Briefing | Phase::Failed => {
                self.release_camera_status();
                vec![
                    Effect::StopMonitoring,
                    Effect::ReleaseCamera,
                    Effect::ExitFullscreen,
                ]
            }
            Phase::Submitting | Phase::Completed => Vec::new(),
        };
        self.closed = true;
        effects
    }

    fn on_tick(&mut self, now_ms: u64) -> Vec<Effect> {
        if self.phase != Phase::Active {
            return Vec::new();
        }
        self.advance_clock(now_ms);

        match self.reentry_due_ms {
            Some(due) if now_ms >= due => {
                self.reentry_due_ms = None;
                vec![Effect::ReenterFullscreen]
            }
            _ => Vec::new(),
        }
    }

    fn on_dismiss_warning(&mut self) -> Vec<Effect> {
        self.warning = None;
        Vec::new()
    }

    fn on_submission_succeeded(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Submitting {
            return Vec::new();
        }
        self.phase = Phase::Completed;
        self.last_failure_retriable = None;
        tracing::info!(
            session_id = %self.session_id,
            attempts = self.attempts,
            "interview submission completed"
        );
        self.release_camera_status();
        vec![Effect::ReleaseCamera, Effect::ClearCachedSession]
    }

    fn on_submission_failed(&mut self, retriable: bool, message: String) -> Vec<Effect> {
        if self.phase != Phase::Submitting {
            return Vec::new();
        }
        self.phase = Phase::Failed;
        self.last_failure_retriable = Some(retriable);
        tracing::error!(
            session_id = %self.session_id,
            attempts = self.attempts,
            retriable,
            error = %message,
            "interview submission failed"
        );
        self.release_camera_status();
        vec![
            Effect::ReleaseCamera,
            Effect::Alert(SUBMISSION_FAILED_ALERT.to_string()),
        ]
    }

    fn on_retry(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Failed {
            return Vec::new();
        }
        let Some(request) = self.pending.clone() else {
            return Vec::new();
        };
        self.phase = Phase::Submitting;
        self.attempts += 1;
        tracing::info!(
            session_id = %self.session_id,
            attempts = self.attempts,
            "retrying interview submission"
        );
        vec![Effect::Submit(request)]
    }

    /// The submission gate: the only way into `Submitting` from `Active`.
    fn begin_submission(&mut self, reason: TerminationReason, now_ms: u64) -> Vec<Effect> {
        if self.phase != Phase::Active {
            return Vec::new();
        }
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };

        let stop_at = self.clock_now_ms.max(now_ms);
        self.clock.stop(stop_at);
        self.clock_now_ms = stop_at;
        self.tracker.seal();
        self.reentry_due_ms = None;

        let request = session.to_submission(self.clock.elapsed_seconds(stop_at), reason);
        self.pending = Some(request.clone());
        self.reason = Some(reason);
        self.phase = Phase::Submitting;
        self.attempts += 1;
        self.release_camera_status();

        tracing::info!(
            session_id = %self.session_id,
            reason = reason.as_str(),
            duration_seconds = request.duration_seconds,
            violation_count = self.tracker.count(),
            "interview entering submission"
        );

        vec![
            Effect::StopMonitoring,
            Effect::ReleaseCamera,
            Effect::ExitFullscreen,
            Effect::Submit(request),
        ]
    }

    fn advance_clock(&mut self, now_ms: u64) {
        self.clock_now_ms = self.clock_now_ms.max(now_ms);
    }

    fn release_camera_status(&mut self) {
        if matches!(self.camera, CameraStatus::Live | CameraStatus::Acquiring) {
            self.camera = CameraStatus::Released;
        }
    }
}

/// Session-level errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No questions are stored for the session.
    #[error("no questions are available for this session")]
    QuestionsUnavailable,
    /// Fullscreen is required on this device and was not granted.
    #[error("fullscreen mode is required for the interview")]
    FullscreenRequired,
    /// Manual submission is only offered on the last question.
    #[error("submit is only available on the last question")]
    NotOnLastQuestion,
    /// Answers can only change while the interview is active.
    #[error("answers cannot be edited in phase {0:?}")]
    NotEditable(Phase),
    /// Operation does not apply to the current phase.
    #[error("{operation} is not allowed in phase {phase:?}")]
    InvalidPhase {
        /// Rejected operation.
        operation: &'static str,
        /// Phase at the time of the call.
        phase: Phase,
    },
    /// Session data model error, including out-of-range answer edits.
    #[error("session model error: {0}")]
    Core(#[from] CoreError),
    /// Question source failure.
    #[error("session store error: {0}")]
    Store(#[from] StoreError),
}
