#![warn(missing_docs)]
//! # proctor-core
//!
//! ## Purpose
//! Defines the pure data model used across the `proctor` workspace.
//!
//! ## Responsibilities
//! - Represent one interview [`Session`]: fixed questions plus an answer buffer
//!   with a bounded question pointer.
//! - Name the lifecycle [`Phase`] and the [`TerminationReason`] carried in
//!   submission payloads.
//! - Encode/decode the [`SubmissionRequest`] sent to the submission endpoint.
//! - Provide the [`ElapsedClock`] that drives the visible interview timer.
//!
//! ## Data flow
//! The session store yields question text -> [`Session::new`] builds the answer
//! buffer -> the session controller mutates answers and navigation -> on
//! submission the buffer is frozen into a [`SubmissionRequest`].
//!
//! ## Ownership and lifetimes
//! Sessions own their question and answer strings so the controller can hand
//! snapshots to the presentation layer without borrowing live state.
//!
//! ## Error model
//! Validation failures (blank session id, empty question set, out-of-range
//! answer index) return [`CoreError`] variants with caller-actionable
//! categorization.
//!
//! ## Security and privacy notes
//! Answer text is candidate data. This crate never logs it and the `Debug`
//! output of [`Session`] is the only place it can surface.
//!
//! ## Example
//! ```rust
//! use proctor_core::Session;
//!
//! let mut session = Session::new("session-1", vec!["q1".into(), "q2".into()]).unwrap();
//! session.set_answer(1, "fn main() {}").unwrap();
//! session.next();
//! assert_eq!(session.current_answer(), "fn main() {}");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason text sent when violations end the interview.
pub const VIOLATION_REASON_TEXT: &str = "Multiple violations detected";

/// Reason text sent when the hosting view is discarded mid-interview.
pub const NAVIGATION_AWAY_REASON_TEXT: &str = "Candidate navigated away from the interview";

/// Interview lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Questions are not loaded yet.
    Idle,
    /// Questions loaded; candidate reads the guidelines and sees the camera preview.
    Briefing,
    /// Interview running; timer and integrity monitoring are live.
    Active,
    /// A submission call is in flight.
    Submitting,
    /// Submission succeeded. No further transitions occur.
    Completed,
    /// Submission failed. Only a manual retry leaves this phase.
    Failed,
}

impl Phase {
    /// Returns `true` for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed)
    }

    /// Returns `true` once the session has left `Active` for good.
    pub fn has_left_active(self) -> bool {
        matches!(self, Phase::Submitting | Phase::Completed | Phase::Failed)
    }
}

/// Why the active phase ended. Carried in the submission payload only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminationReason {
    /// Candidate pressed submit on the last question.
    Manual,
    /// Violation count reached the escalation threshold.
    TimeoutViolations,
    /// Hosting view was discarded while the interview was running.
    NavigationAway,
}

impl TerminationReason {
    /// Stable wire tag for the reason.
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationReason::Manual => "manual",
            TerminationReason::TimeoutViolations => "timeout-violations",
            TerminationReason::NavigationAway => "navigation-away",
        }
    }

    /// Returns `true` when the submission was not requested by the candidate.
    pub fn is_automatic(self) -> bool {
        !matches!(self, TerminationReason::Manual)
    }

    /// Human-readable payload reason; manual submissions carry none.
    pub fn payload_text(self) -> Option<&'static str> {
        match self {
            TerminationReason::Manual => None,
            TerminationReason::TimeoutViolations => Some(VIOLATION_REASON_TEXT),
            TerminationReason::NavigationAway => Some(NAVIGATION_AWAY_REASON_TEXT),
        }
    }
}

/// Integrity-risk event observed while the interview is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// Candidate left fullscreen.
    FullscreenExit,
    /// Page became hidden (tab switch, app switch, minimize).
    TabHidden,
}

impl ViolationKind {
    /// Stable wire tag for the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::FullscreenExit => "fullscreen-exit",
            ViolationKind::TabHidden => "tab-hidden",
        }
    }
}

/// Question set and answer buffer for one interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    session_id: String,
    questions: Vec<String>,
    answers: Vec<String>,
    current_index: usize,
}

impl Session {
    /// Builds a session with one empty answer slot per question.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidSessionId`] for a blank id and
    /// [`CoreError::NoQuestions`] for an empty question set.
    pub fn new(session_id: impl Into<String>, questions: Vec<String>) -> Result<Self, CoreError> {
        let session_id = session_id.into();
        if session_id.trim().is_empty() {
            return Err(CoreError::InvalidSessionId);
        }
        if questions.is_empty() {
            return Err(CoreError::NoQuestions);
        }

        let answers = vec![String::new(); questions.len()];
        Ok(Self {
            session_id,
            questions,
            answers,
            current_index: 0,
        })
    }

    /// Opaque session identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Number of questions (and answer slots).
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always `false`; construction rejects empty question sets.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Ordered question prompts.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    /// Ordered answer buffer.
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Current question pointer.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Prompt text at the current pointer.
    pub fn current_question(&self) -> &str {
        &self.questions[self.current_index]
    }

    /// Answer text at the current pointer.
    pub fn current_answer(&self) -> &str {
        &self.answers[self.current_index]
    }

    /// Returns `true` when the pointer is on the final question.
    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    /// Overwrites one answer slot.
    ///
    /// # Errors
    /// Returns [`CoreError::OutOfRange`] when `index >= len()`; the buffer is
    /// left untouched.
    pub fn set_answer(&mut self, index: usize, text: impl Into<String>) -> Result<(), CoreError> {
        let len = self.answers.len();
        let slot = self
            .answers
            .get_mut(index)
            .ok_or(CoreError::OutOfRange { index, len })?;
        *slot = text.into();
        Ok(())
    }

    /// Moves to the next question. No-op on the last one.
    pub fn next(&mut self) -> bool {
        if self.is_last_question() {
            return false;
        }
        self.current_index += 1;
        true
    }

    /// Moves to the previous question. No-op on the first one.
    pub fn previous(&mut self) -> bool {
        if self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    /// Freezes the answer buffer into a submission payload.
    pub fn to_submission(
        &self,
        duration_seconds: u64,
        reason: TerminationReason,
    ) -> SubmissionRequest {
        SubmissionRequest {
            session_id: self.session_id.clone(),
            answers: self.answers.clone(),
            duration_seconds,
            auto_submitted: reason.is_automatic(),
            reason: reason.payload_text().map(str::to_string),
        }
    }
}

/// Body accepted by the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    /// Session the answers belong to.
    pub session_id: String,
    /// One answer per question, in question order.
    pub answers: Vec<String>,
    /// Whole seconds the interview timer ran.
    pub duration_seconds: u64,
    /// `true` unless the candidate pressed submit.
    pub auto_submitted: bool,
    /// Reason for automatic submissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SubmissionRequest {
    /// Serializes payload to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(CoreError::Codec)
    }

    /// Deserializes payload from JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON decoding fails.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(raw).map_err(CoreError::Codec)
    }
}

/// Stopwatch accumulating whole seconds while running.
///
/// Time is passed in explicitly as epoch milliseconds so callers (and tests)
/// own the time source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElapsedClock {
    accumulated_ms: u64,
    running_since_ms: Option<u64>,
}

impl ElapsedClock {
    /// Creates a stopped clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts accumulating. No-op when already running.
    pub fn start(&mut self, now_ms: u64) {
        if self.running_since_ms.is_none() {
            self.running_since_ms = Some(now_ms);
        }
    }

    /// Stops accumulating. No-op when already stopped.
    pub fn stop(&mut self, now_ms: u64) {
        if let Some(since) = self.running_since_ms.take() {
            self.accumulated_ms = self
                .accumulated_ms
                .saturating_add(now_ms.saturating_sub(since));
        }
    }

    /// Returns `true` while the clock accumulates.
    pub fn is_running(&self) -> bool {
        self.running_since_ms.is_some()
    }

    /// Whole seconds accumulated up to `now_ms`.
    pub fn elapsed_seconds(&self, now_ms: u64) -> u64 {
        let running = self
            .running_since_ms
            .map_or(0, |since| now_ms.saturating_sub(since));
        self.accumulated_ms.saturating_add(running) / 1_000
    }
}

/// Error type for core domain validation and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Session id cannot be blank.
    #[error("session id is empty")]
    InvalidSessionId,
    /// A session needs at least one question.
    #[error("question set is empty")]
    NoQuestions,
    /// Answer index outside the question range.
    #[error("answer index {index} out of range for {len} questions")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of answer slots.
        len: usize,
    },
    /// JSON encoding/decoding error.
    #[error("payload codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for the session buffer and clock.

    use super::*;

    fn questions(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("question {index}")).collect()
    }

    #[test]
    fn navigation_is_clamped_at_both_ends() {
        let mut session = Session::new("s", questions(2)).expect("session should build");
        assert!(!session.previous());
        assert!(session.next());
        assert!(!session.next());
        assert_eq!(session.current_index(), 1);
        assert!(session.is_last_question());
    }

    #[test]
    fn out_of_range_answer_leaves_buffer_untouched() {
        let mut session = Session::new("s", questions(2)).expect("session should build");
        let error = session.set_answer(2, "x").expect_err("index 2 is out of range");
        assert!(matches!(error, CoreError::OutOfRange { index: 2, len: 2 }));
        assert_eq!(session.answers(), &["".to_string(), "".to_string()]);
    }

    #[test]
    fn clock_excludes_stopped_intervals() {
        let mut clock = ElapsedClock::new();
        clock.start(1_000);
        clock.stop(4_500);
        clock.start(10_000);
        assert_eq!(clock.elapsed_seconds(12_000), 5);
        clock.stop(12_000);
        assert_eq!(clock.elapsed_seconds(99_000), 5);
    }

    #[test]
    fn manual_submission_carries_no_reason() {
        let session = Session::new("s", questions(1)).expect("session should build");
        let request = session.to_submission(7, TerminationReason::Manual);
        assert!(!request.auto_submitted);
        assert_eq!(request.reason, None);
    }
}
