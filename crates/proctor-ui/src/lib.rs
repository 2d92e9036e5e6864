#![warn(missing_docs)]
//! # proctor-ui
//!
//! ## Purpose
//! Defines the display-facing projection of an interview session.
//!
//! ## Responsibilities
//! - Format the timer, question counter and violation badge.
//! - Decide which primary action (next, submit, submitting) is offered.
//! - Produce the briefing guidelines for the current form factor.
//! - Project camera and submission progress into stage statuses.
//!
//! ## Data flow
//! Controller snapshot + loaded session -> [`SessionView::project`] -> rendered
//! by the host view layer.
//!
//! ## Ownership and lifetimes
//! `SessionView` owns all strings so the host can keep it across controller
//! calls without borrowing controller state.
//!
//! ## Error model
//! Projection is infallible. Missing session data renders as the loading
//! state.
//!
//! ## Security and privacy notes
//! Only the current prompt and the current answer are copied into the view;
//! the full answer buffer is never projected.

use proctor_core::{Phase, Session};
use proctor_guards::FormFactor;
use proctor_session::{CameraStatus, SessionSnapshot};

/// Generic stage status used for camera and submission progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// Stage has not started.
    Idle,
    /// Stage is currently running.
    Running,
    /// Stage completed successfully.
    Healthy,
    /// Stage encountered non-fatal error.
    Degraded,
}

/// Main action button state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    /// No action offered (briefing, idle, terminal).
    Hidden,
    /// Advance to the next question.
    Next,
    /// Submit and finish; shown on the last question.
    Submit,
    /// Submission in flight; button disabled.
    Submitting,
    /// Submission failed; manual retry offered.
    Retry,
}

impl PrimaryAction {
    /// Button caption.
    pub fn label(self) -> &'static str {
        match self {
            PrimaryAction::Hidden => "",
            PrimaryAction::Next => "Next",
            PrimaryAction::Submit => "Submit & Finish Interview",
            PrimaryAction::Submitting => "Submitting...",
            PrimaryAction::Retry => "Retry Submission",
        }
    }
}

/// Aggregate view state for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// App version string.
    pub version: String,
    /// Lifecycle phase.
    pub phase: Phase,
    /// Headline status text.
    pub status_text: String,
    /// Timer as `MM:SS`.
    pub timer_text: String,
    /// "Question i/n", empty while idle.
    pub question_label: String,
    /// Current prompt text.
    pub prompt: String,
    /// Current answer text for the editor.
    pub answer: String,
    /// "k/threshold" once at least one violation was counted.
    pub violation_badge: Option<String>,
    /// Warning waiting for acknowledgement.
    pub warning: Option<String>,
    /// Main button.
    pub primary_action: PrimaryAction,
    /// Whether "Previous" is enabled.
    pub previous_enabled: bool,
    /// Briefing guidelines; empty outside briefing.
    pub guidelines: Vec<String>,
    /// Camera stage.
    pub camera: StageStatus,
    /// Submission stage.
    pub submission: StageStatus,
    /// Whether integrity monitoring runs for this session.
    pub monitoring_enabled: bool,
}

impl SessionView {
    /// Projects controller state into a view.
    pub fn project(
        version: impl Into<String>,
        snapshot: &SessionSnapshot,
        session: Option<&Session>,
        form_factor: FormFactor,
    ) -> Self {
        let question_label = if snapshot.question_count == 0 {
            String::new()
        } else {
            format!(
                "Question {}/{}",
                snapshot.current_index + 1,
                snapshot.question_count
            )
        };

        let on_last = session.is_some_and(Session::is_last_question);
        let primary_action = match snapshot.phase {
            Phase::Active if on_last => PrimaryAction::Submit,
            Phase::Active => PrimaryAction::Next,
            Phase::Submitting => PrimaryAction::Submitting,
            Phase::Failed => PrimaryAction::Retry,
            Phase::Idle | Phase::Briefing | Phase::Completed => PrimaryAction::Hidden,
        };

        let guidelines = if snapshot.phase == Phase::Briefing {
            briefing_guidelines(form_factor, snapshot.violation_threshold)
        } else {
            Vec::new()
        };

        Self {
            version: version.into(),
            phase: snapshot.phase,
            status_text: status_text(snapshot).to_string(),
            timer_text: format_elapsed(snapshot.elapsed_seconds),
            question_label,
            prompt: session
                .map(|session| session.current_question().to_string())
                .unwrap_or_default(),
            answer: session
                .map(|session| session.current_answer().to_string())
                .unwrap_or_default(),
            violation_badge: (snapshot.violation_count > 0).then(|| {
                format!(
                    "{}/{}",
                    snapshot.violation_count, snapshot.violation_threshold
                )
            }),
            warning: snapshot.warning.clone(),
            primary_action,
            previous_enabled: snapshot.phase == Phase::Active && snapshot.current_index > 0,
            guidelines,
            camera: camera_stage(&snapshot.camera),
            submission: submission_stage(snapshot.phase),
            monitoring_enabled: snapshot.monitoring_enabled,
        }
    }

    /// Returns `true` while the warning modal should be shown.
    pub fn warning_visible(&self) -> bool {
        self.warning.is_some()
    }
}

/// Formats whole seconds as zero-padded `MM:SS`. Minutes are not wrapped.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Guidelines shown before the interview starts.
pub fn briefing_guidelines(form_factor: FormFactor, threshold: u32) -> Vec<String> {
    let mut lines = Vec::new();
    if !form_factor.is_mobile() {
        lines.push("This interview must be completed in fullscreen mode.".to_string());
    }
    let warnings = threshold.saturating_sub(1);
    lines.push(format!(
        "Tab switching is monitored. You will receive {warnings} warning{}.",
        if warnings == 1 { "" } else { "s" }
    ));
    lines.push(format!(
        "After {threshold} violations, the interview will auto-submit."
    ));
    lines.push("Ensure your webcam is enabled for monitoring.".to_string());
    if form_factor.is_mobile() {
        lines.push("Please do not switch apps during the interview.".to_string());
    }
    lines
}

fn status_text(snapshot: &SessionSnapshot) -> &'static str {
    match snapshot.phase {
        Phase::Idle => "Preparing Interview Environment...",
        Phase::Briefing => "AI Technical Interview",
        Phase::Active => "Interview in progress",
        Phase::Submitting => "Submitting interview...",
        Phase::Completed if snapshot.termination_reason.is_some_and(|r| r.is_automatic()) => {
            "Interview auto-submitted"
        }
        Phase::Completed => "Interview submitted",
        Phase::Failed => "Submission failed. Your answers are saved; please retry.",
    }
}

fn camera_stage(camera: &CameraStatus) -> StageStatus {
    match camera {
        CameraStatus::NotRequested | CameraStatus::Released => StageStatus::Idle,
        CameraStatus::Acquiring => StageStatus::Running,
        CameraStatus::Live => StageStatus::Healthy,
        CameraStatus::Failed(_) => StageStatus::Degraded,
    }
}

fn submission_stage(phase: Phase) -> StageStatus {
    match phase {
        Phase::Idle | Phase::Briefing | Phase::Active => StageStatus::Idle,
        Phase::Submitting => StageStatus::Running,
        Phase::Completed => StageStatus::Healthy,
        Phase::Failed => StageStatus::Degraded,
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for view formatting.

    use proctor_session::{Event, SessionConfig, SessionMachine};

    use super::*;

    #[test]
    fn formats_timer_as_minutes_and_seconds() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(65), "01:05");
        assert_eq!(format_elapsed(3_600), "60:00");
    }

    #[test]
    fn guidelines_depend_on_form_factor() {
        let desktop = briefing_guidelines(FormFactor::Desktop, 2);
        assert!(desktop[0].contains("fullscreen"));
        assert!(desktop[1].ends_with("1 warning."));

        let mobile = briefing_guidelines(FormFactor::Mobile, 2);
        assert!(!mobile.iter().any(|line| line.contains("fullscreen")));
        assert!(mobile.last().is_some_and(|line| line.contains("switch apps")));
    }

    #[test]
    fn last_question_offers_submit_and_badge_after_violation() {
        let mut machine = SessionMachine::new("s", SessionConfig::default());
        machine
            .handle(Event::Load {
                questions: Some(vec!["a".into(), "b".into()]),
            })
            .expect("load");
        machine
            .handle(Event::Start {
                fullscreen_ok: true,
                now_ms: 0,
            })
            .expect("start");

        let view = SessionView::project(
            "v0.1.0",
            &machine.snapshot(),
            machine.session(),
            FormFactor::Desktop,
        );
        assert_eq!(view.primary_action, PrimaryAction::Next);
        assert!(!view.previous_enabled);
        assert_eq!(view.violation_badge, None);

        machine.handle(Event::Next).expect("next");
        machine
            .handle(Event::Violation {
                kind: proctor_core::ViolationKind::TabHidden,
                now_ms: 1_000,
            })
            .expect("violation");

        let view = SessionView::project(
            "v0.1.0",
            &machine.snapshot(),
            machine.session(),
            FormFactor::Desktop,
        );
        assert_eq!(view.primary_action, PrimaryAction::Submit);
        assert_eq!(view.question_label, "Question 2/2");
        assert_eq!(view.violation_badge.as_deref(), Some("1/2"));
        assert!(view.warning_visible());
        assert!(view.previous_enabled);
    }
}
