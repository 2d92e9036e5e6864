//! Effect-executing session controller.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use proctor_core::{Phase, Session};
use proctor_device::{DeviceMonitor, StreamHandle};
use proctor_guards::{FullscreenGuard, GuardEvent, Visibility, VisibilityGuard};
use proctor_submit::{FailureClass, SubmissionClient, classify_submit_error};

use crate::machine::{Effect, Event, SessionConfig, SessionError, SessionMachine, SessionSnapshot};
use crate::store::SessionStore;

/// Capability providers injected into a controller.
#[derive(Clone)]
pub struct Providers {
    /// Camera acquisition.
    pub camera: DeviceMonitor,
    /// Fullscreen capability, shared with the host glue that feeds it.
    pub fullscreen: Arc<FullscreenGuard>,
    /// Visibility capability, shared with the host glue that feeds it.
    pub visibility: Arc<VisibilityGuard>,
    /// Submission endpoint client.
    pub submitter: SubmissionClient,
    /// Question source and local cache.
    pub store: Arc<dyn SessionStore>,
}

/// Runs one interview session against injected providers.
///
/// Every public method delivers exactly one event to the machine and then
/// drains the resulting effects, including the events produced by executing
/// them, before returning.
pub struct SessionController {
    machine: SessionMachine,
    providers: Providers,
    stream: StreamHandle,
    guard_events: Option<Receiver<GuardEvent>>,
    alerts: Vec<String>,
}

impl SessionController {
    /// Creates an idle controller.
    pub fn new(session_id: impl Into<String>, config: SessionConfig, providers: Providers) -> Self {
        Self {
            machine: SessionMachine::new(session_id, config),
            providers,
            stream: StreamHandle::unacquired(),
            guard_events: None,
            alerts: Vec::new(),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    /// Loaded session, `None` while idle.
    pub fn session(&self) -> Option<&Session> {
        self.machine.session()
    }

    /// Display-safe snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.machine.snapshot()
    }

    /// Alerts surfaced so far, oldest first. Draining is left to the host.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    /// Returns `true` while the camera stream is held.
    pub fn camera_live(&self) -> bool {
        self.stream.is_live()
    }

    /// Returns `true` while guard subscriptions are held.
    pub fn monitoring_live(&self) -> bool {
        self.guard_events.is_some()
    }

    /// Reads the stored questions and enters `Briefing`; camera acquisition
    /// starts here so the candidate sees the preview before starting.
    ///
    /// # Errors
    /// Returns [`SessionError::QuestionsUnavailable`] when nothing is stored
    /// and [`SessionError::Store`] when storage fails; the controller stays
    /// `Idle`.
    pub fn load(&mut self) -> Result<(), SessionError> {
        let questions = self
            .providers
            .store
            .load_questions(self.machine.session_id())?;
        self.apply(Event::Load { questions })?;
        tracing::info!(
            session_id = %self.machine.session_id(),
            phase = ?self.phase(),
            "interview session loaded"
        );
        Ok(())
    }

    /// Starts the interview.
    ///
    /// # Errors
    /// Returns [`SessionError::FullscreenRequired`] when fullscreen is required
    /// and refused, and [`SessionError::QuestionsUnavailable`] when called
    /// before a successful load. The phase is unchanged on error.
    pub fn start(&mut self, now_ms: u64) -> Result<(), SessionError> {
        let fullscreen_ok = match self.phase() {
            Phase::Briefing if !self.machine.is_closed() => self.providers.fullscreen.enter(),
            _ => true,
        };
        self.apply(Event::Start {
            fullscreen_ok,
            now_ms,
        })?;
        if self.phase() == Phase::Active {
            tracing::info!(session_id = %self.machine.session_id(), "interview started");
        }
        Ok(())
    }

    /// Overwrites one answer.
    ///
    /// # Errors
    /// Returns [`SessionError::Core`] wrapping `OutOfRange` for a bad index and
    /// [`SessionError::NotEditable`] outside `Active`.
    pub fn set_answer(&mut self, index: usize, text: impl Into<String>) -> Result<(), SessionError> {
        self.apply(Event::Answer {
            index,
            text: text.into(),
        })
    }

    /// Moves to the next question; no-op at the end.
    pub fn next(&mut self) {
        self.apply_infallible(Event::Next);
    }

    /// Moves to the previous question; no-op at the start.
    pub fn previous(&mut self) {
        self.apply_infallible(Event::Previous);
    }

    /// Manual submission from the last question. Returns the resulting phase.
    ///
    /// # Errors
    /// Returns [`SessionError::NotOnLastQuestion`] away from the last question
    /// and [`SessionError::InvalidPhase`] before the interview started.
    pub fn submit(&mut self, now_ms: u64) -> Result<Phase, SessionError> {
        self.apply(Event::SubmitRequested { now_ms })?;
        Ok(self.phase())
    }

    /// Resends the frozen payload after a failure. Returns the resulting phase.
    pub fn retry(&mut self) -> Phase {
        self.apply_infallible(Event::Retry);
        self.phase()
    }

    /// One-second timer tick; fires the fullscreen re-entry when due.
    pub fn tick(&mut self, now_ms: u64) {
        self.apply_infallible(Event::Tick { now_ms });
    }

    /// Acknowledges the current warning.
    pub fn dismiss_warning(&mut self) {
        self.apply_infallible(Event::DismissWarning);
    }

    /// Drains the guard channel and counts every classified violation in
    /// delivery order across both guards.
    pub fn poll_guards(&mut self, now_ms: u64) {
        let events: Vec<GuardEvent> = self
            .guard_events
            .as_ref()
            .map(|events| events.try_iter().collect())
            .unwrap_or_default();
        for event in events {
            match event {
                GuardEvent::Fullscreen(is_fullscreen) => {
                    self.on_fullscreen_change(is_fullscreen, now_ms);
                }
                GuardEvent::Visibility(visibility) => {
                    self.on_visibility_change(visibility, now_ms);
                }
            }
        }
    }

    /// Handles one fullscreen transition delivered directly by the host.
    pub fn on_fullscreen_change(&mut self, is_fullscreen: bool, now_ms: u64) {
        if let Some(kind) = self.providers.fullscreen.classify(is_fullscreen) {
            self.apply_infallible(Event::Violation { kind, now_ms });
        }
    }

    /// Handles one visibility transition delivered directly by the host.
    pub fn on_visibility_change(&mut self, visibility: Visibility, now_ms: u64) {
        if let Some(kind) = self.providers.visibility.classify(visibility) {
            self.apply_infallible(Event::Violation { kind, now_ms });
        }
    }

    /// The hosting view is being discarded. While active this sends a
    /// best-effort `navigation-away` submission; otherwise it only releases
    /// resources.
    pub fn leave(&mut self, now_ms: u64) {
        self.apply_infallible(Event::Leave { now_ms });
        self.teardown();
    }

    /// Releases the camera, drops guard subscriptions and exits fullscreen
    /// without notifying the server. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.stop_monitoring();
        self.providers.camera.release(&mut self.stream);
        self.providers.fullscreen.exit();
    }

    fn apply_infallible(&mut self, event: Event) {
        if let Err(error) = self.apply(event) {
            tracing::debug!(
                session_id = %self.machine.session_id(),
                %error,
                "event rejected"
            );
        }
    }

    fn apply(&mut self, event: Event) -> Result<(), SessionError> {
        let mut queue: VecDeque<Effect> = self.machine.handle(event)?.into();

        while let Some(effect) = queue.pop_front() {
            let follow_up = self.execute(effect);
            for event in follow_up {
                queue.extend(self.machine.handle(event)?);
            }
        }
        Ok(())
    }

    fn execute(&mut self, effect: Effect) -> Option<Event> {
        match effect {
            Effect::AcquireCamera => Some(self.acquire_camera()),
            Effect::ReleaseCamera => {
                self.providers.camera.release(&mut self.stream);
                None
            }
            Effect::StartMonitoring => {
                self.providers.fullscreen.arm();
                self.providers.visibility.arm();
                let (sender, receiver) = mpsc::channel();
                self.providers.fullscreen.subscribe_with(sender.clone());
                self.providers.visibility.subscribe_with(sender);
                self.guard_events = Some(receiver);
                None
            }
            Effect::StopMonitoring => {
                self.stop_monitoring();
                None
            }
            Effect::ExitFullscreen => {
                self.providers.fullscreen.exit();
                None
            }
            Effect::ReenterFullscreen => {
                let entered = self.providers.fullscreen.enter();
                tracing::info!(
                    session_id = %self.machine.session_id(),
                    entered,
                    "fullscreen re-entry attempted"
                );
                None
            }
            Effect::ShowWarning(message) | Effect::Alert(message) => {
                self.alerts.push(message);
                None
            }
            Effect::Submit(request) => Some(match self.providers.submitter.submit(&request) {
                Ok(_) => Event::SubmissionSucceeded,
                Err(error) => Event::SubmissionFailed {
                    retriable: classify_submit_error(&error) == FailureClass::Retriable,
                    message: error.to_string(),
                },
            }),
            Effect::ClearCachedSession => {
                if let Err(error) = self.providers.store.clear(self.machine.session_id()) {
                    tracing::warn!(
                        session_id = %self.machine.session_id(),
                        %error,
                        "failed to clear cached session state"
                    );
                }
                None
            }
        }
    }

    fn acquire_camera(&mut self) -> Event {
        if self.stream.is_live() {
            return Event::CameraAcquired;
        }
        match self.providers.camera.acquire() {
            Ok(handle) => {
                self.stream = handle;
                Event::CameraAcquired
            }
            Err(error) => {
                tracing::error!(
                    session_id = %self.machine.session_id(),
                    %error,
                    "camera acquisition failed"
                );
                Event::CameraFailed {
                    message: error.to_string(),
                }
            }
        }
    }

    fn stop_monitoring(&mut self) {
        self.providers.fullscreen.disarm();
        self.providers.visibility.disarm();
        self.guard_events = None;
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}
