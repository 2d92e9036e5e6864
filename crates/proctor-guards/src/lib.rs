#![warn(missing_docs)]
//! # proctor-guards
//!
//! ## Purpose
//! Wraps the host's fullscreen and page-visibility capabilities so the session
//! controller never reads global document state directly.
//!
//! ## Responsibilities
//! - Classify the device [`FormFactor`]; fullscreen is meaningless on mobile.
//! - [`FullscreenGuard`]: best-effort enter, idempotent exit, and a restartable
//!   subscription of "is fullscreen now" transitions.
//! - [`VisibilityGuard`]: subscription of visibility transitions that only
//!   classify as violations while armed.
//! - [`GuardEvent`]: the one transition type both guards publish, so a single
//!   channel carries them in delivery order.
//!
//! ## Data flow
//! Host glue calls `notify(..)` on a guard -> every live subscriber receives
//! a [`GuardEvent`] -> the controller drains one channel shared by both guards
//! and asks the owning guard to `classify(..)` each event into a
//! [`ViolationKind`] for the tracker.
//!
//! ## Ownership and lifetimes
//! Guards are shared (`Arc`) between the host glue that feeds them and the
//! controller that consumes them. Subscribers own their receivers; dropping a
//! receiver unsubscribes it on the next notification.
//!
//! ## Error model
//! Fullscreen refusal is reported by the [`FullscreenApi`] as [`GuardError`]
//! and collapsed to `false` by [`FullscreenGuard::enter`].
//!
//! ## Security and privacy notes
//! Guards observe focus and display mode only, never page content.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use proctor_core::ViolationKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Viewport width at or below which the device counts as mobile.
pub const MOBILE_MAX_VIEWPORT_WIDTH: u32 = 768;

const MOBILE_USER_AGENT_MARKERS: [&str; 7] = [
    "android",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Device class that decides whether fullscreen is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormFactor {
    /// Fullscreen required and monitored.
    Desktop,
    /// Small viewport; fullscreen guard disabled.
    Mobile,
}

impl FormFactor {
    /// Classifies from viewport width and user agent.
    pub fn detect(viewport_width: u32, user_agent: &str) -> Self {
        let agent = user_agent.to_ascii_lowercase();
        let mobile_agent = MOBILE_USER_AGENT_MARKERS
            .iter()
            .any(|marker| agent.contains(marker));

        if viewport_width <= MOBILE_MAX_VIEWPORT_WIDTH || mobile_agent {
            FormFactor::Mobile
        } else {
            FormFactor::Desktop
        }
    }

    /// Returns `true` for mobile.
    pub fn is_mobile(self) -> bool {
        self == FormFactor::Mobile
    }
}

/// Host fullscreen capability.
pub trait FullscreenApi: Send + Sync {
    /// Requests fullscreen on the interview surface.
    ///
    /// # Errors
    /// Returns [`GuardError::FullscreenDenied`] when the host refuses and
    /// [`GuardError::Unsupported`] when the host has no fullscreen API.
    fn request(&self) -> Result<(), GuardError>;

    /// Leaves fullscreen.
    fn exit(&self);

    /// Current fullscreen state of the document.
    fn is_fullscreen(&self) -> bool;
}

/// One transition published by a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardEvent {
    /// Fullscreen state changed; `true` when now fullscreen.
    Fullscreen(bool),
    /// Page visibility changed.
    Visibility(Visibility),
}

fn publish(subscribers: &Mutex<Vec<Sender<GuardEvent>>>, event: GuardEvent) {
    if let Ok(mut subscribers) = subscribers.lock() {
        subscribers.retain(|sender| sender.send(event).is_ok());
    }
}

/// Fullscreen capability provider with form-factor gating.
pub struct FullscreenGuard {
    api: Arc<dyn FullscreenApi>,
    form_factor: FormFactor,
    armed: AtomicBool,
    subscribers: Mutex<Vec<Sender<GuardEvent>>>,
}

impl FullscreenGuard {
    /// Creates a guard over a host API.
    pub fn new(api: Arc<dyn FullscreenApi>, form_factor: FormFactor) -> Self {
        Self {
            api,
            form_factor,
            armed: AtomicBool::new(false),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Returns `true` when starting the interview requires fullscreen.
    pub fn is_required(&self) -> bool {
        !self.form_factor.is_mobile()
    }

    /// Attempts to enter fullscreen. Always succeeds on mobile without
    /// touching the host API.
    pub fn enter(&self) -> bool {
        if self.form_factor.is_mobile() {
            return true;
        }
        match self.api.request() {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, "fullscreen request refused");
                false
            }
        }
    }

    /// Leaves fullscreen if currently in it.
    pub fn exit(&self) {
        if self.form_factor.is_mobile() || !self.api.is_fullscreen() {
            return;
        }
        self.api.exit();
    }

    /// Subscribes to fullscreen transitions on a fresh channel.
    ///
    /// On mobile the returned receiver never yields.
    pub fn subscribe(&self) -> Receiver<GuardEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribe_with(sender);
        receiver
    }

    /// Adds an existing channel as subscriber, typically one shared with
    /// [`VisibilityGuard::subscribe_with`].
    pub fn subscribe_with(&self, sender: Sender<GuardEvent>) {
        if !self.form_factor.is_mobile()
            && let Ok(mut subscribers) = self.subscribers.lock()
        {
            subscribers.push(sender);
        }
    }

    /// Delivers one fullscreen transition to live subscribers.
    pub fn notify(&self, is_fullscreen: bool) {
        if self.form_factor.is_mobile() {
            return;
        }
        publish(&self.subscribers, GuardEvent::Fullscreen(is_fullscreen));
    }

    /// Enables violation classification.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Disables violation classification.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    /// Maps a transition to a violation. Only exits count, only while armed.
    pub fn classify(&self, is_fullscreen: bool) -> Option<ViolationKind> {
        let armed = self.armed.load(Ordering::SeqCst);
        (armed && !is_fullscreen && !self.form_factor.is_mobile())
            .then_some(ViolationKind::FullscreenExit)
    }
}

/// Page visibility state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Page is shown.
    Visible,
    /// Page is hidden (tab switch, app switch, minimize).
    Hidden,
}

/// Page-visibility capability provider.
#[derive(Default)]
pub struct VisibilityGuard {
    armed: AtomicBool,
    subscribers: Mutex<Vec<Sender<GuardEvent>>>,
}

impl VisibilityGuard {
    /// Creates a disarmed guard without subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to visibility transitions on a fresh channel.
    pub fn subscribe(&self) -> Receiver<GuardEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribe_with(sender);
        receiver
    }

    /// Adds an existing channel as subscriber.
    pub fn subscribe_with(&self, sender: Sender<GuardEvent>) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(sender);
        }
    }

    /// Delivers one visibility transition to live subscribers.
    pub fn notify(&self, visibility: Visibility) {
        publish(&self.subscribers, GuardEvent::Visibility(visibility));
    }

    /// Enables violation classification.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Disables violation classification.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
    }

    /// Maps a transition to a violation. Only hides count, only while armed.
    pub fn classify(&self, visibility: Visibility) -> Option<ViolationKind> {
        let armed = self.armed.load(Ordering::SeqCst);
        (armed && visibility == Visibility::Hidden).then_some(ViolationKind::TabHidden)
    }
}

/// Scripted fullscreen host for tests and replay.
#[derive(Debug)]
pub struct SyntheticFullscreen {
    grant: AtomicBool,
    fullscreen: AtomicBool,
    requests: Mutex<u32>,
    exits: Mutex<u32>,
}

impl SyntheticFullscreen {
    /// Creates a host that grants (`true`) or refuses every request.
    pub fn new(grant: bool) -> Self {
        Self {
            grant: AtomicBool::new(grant),
            fullscreen: AtomicBool::new(false),
            requests: Mutex::new(0),
            exits: Mutex::new(0),
        }
    }

    /// Changes whether later requests are granted.
    pub fn set_grant(&self, grant: bool) {
        self.grant.store(grant, Ordering::SeqCst);
    }

    /// Simulates the user leaving fullscreen (e.g. pressing Escape).
    pub fn force_exit(&self) {
        self.fullscreen.store(false, Ordering::SeqCst);
    }

    /// Number of `request` calls seen.
    pub fn request_count(&self) -> u32 {
        self.requests.lock().map(|count| *count).unwrap_or(0)
    }

    /// Number of `exit` calls seen.
    pub fn exit_count(&self) -> u32 {
        self.exits.lock().map(|count| *count).unwrap_or(0)
    }
}

impl FullscreenApi for SyntheticFullscreen {
    fn request(&self) -> Result<(), GuardError> {
        if let Ok(mut count) = self.requests.lock() {
            *count += 1;
        }
        if !self.grant.load(Ordering::SeqCst) {
            return Err(GuardError::FullscreenDenied(
                "synthetic host refused fullscreen".to_string(),
            ));
        }
        self.fullscreen.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn exit(&self) {
        if let Ok(mut count) = self.exits.lock() {
            *count += 1;
        }
        self.fullscreen.store(false, Ordering::SeqCst);
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }
}

/// Guard layer error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// Host refused the fullscreen request.
    #[error("fullscreen denied: {0}")]
    FullscreenDenied(String),
    /// Host has no fullscreen capability.
    #[error("fullscreen unsupported")]
    Unsupported,
}
