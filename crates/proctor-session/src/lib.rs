#![warn(missing_docs)]
//! # proctor-session
//!
//! ## Purpose
//! Runs one proctored interview: phase lifecycle, answer buffer, violation
//! escalation, and the at-most-once submission guarantee.
//!
//! ## Responsibilities
//! - [`SessionMachine`]: pure phase machine. Events in, [`Effect`] lists out.
//!   Every handler checks the current phase first, so a superseded event is a
//!   no-op instead of a second transition.
//! - [`SessionController`]: owns the capability providers (camera, fullscreen,
//!   visibility, submission endpoint, session store), executes effects in
//!   order, and feeds the results of the two suspension points (camera
//!   acquisition, submission) back into the machine.
//! - [`SessionStore`]: question source and cache clearing contract.
//!
//! ## Data flow
//! Host events (start, edits, guard transitions, ticks) -> controller ->
//! [`SessionMachine::handle`] -> effects -> providers -> result events ->
//! machine -> terminal phase.
//!
//! ## Ownership and lifetimes
//! The controller exclusively owns the camera [`proctor_device::StreamHandle`]
//! and the guard subscriptions. Dropping the controller releases both.
//!
//! ## Error model
//! Precondition failures and programmer errors return [`SessionError`] with
//! state untouched. Violations and submission failures are transitions, not
//! errors.
//!
//! ## Security and privacy notes
//! Logs carry session id, phase and counters only; answer and question text
//! are never logged.
//!
//! ## Example
//! ```rust
//! use proctor_core::{Phase, ViolationKind};
//! use proctor_session::{Event, SessionMachine, SessionConfig};
//!
//! let mut machine = SessionMachine::new("session-1", SessionConfig::default());
//! machine.handle(Event::Load { questions: Some(vec!["q1".into()]) }).unwrap();
//! machine.handle(Event::Start { fullscreen_ok: true, now_ms: 0 }).unwrap();
//! machine.handle(Event::Violation { kind: ViolationKind::TabHidden, now_ms: 1_000 }).unwrap();
//! machine.handle(Event::Violation { kind: ViolationKind::TabHidden, now_ms: 2_000 }).unwrap();
//! assert_eq!(machine.phase(), Phase::Submitting);
//! ```

mod controller;
mod machine;
mod store;

pub use controller::{Providers, SessionController};
pub use machine::{
    CameraStatus, Effect, Event, SessionConfig, SessionError, SessionMachine, SessionSnapshot,
    CAMERA_REQUIRED_ALERT, DEFAULT_REENTRY_DELAY_MS, SUBMISSION_FAILED_ALERT,
};
pub use store::{InMemorySessionStore, SessionStore, StoreError};
