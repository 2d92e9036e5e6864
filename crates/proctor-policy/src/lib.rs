#![warn(missing_docs)]
//! # proctor-policy
//!
//! ## Purpose
//! Defines the violation escalation policy and the tracker that applies it.
//!
//! ## Responsibilities
//! - Hold the configurable [`EscalationPolicy`] (threshold plus warning texts).
//! - Count violations in delivery order and map the count to a
//!   [`EscalationDecision`].
//! - Seal the tracker after termination so trailing events are ignored.
//!
//! ## Data flow
//! Guards classify transitions into [`ViolationKind`] -> [`ViolationTracker::record`]
//! -> decision consumed by the session machine.
//!
//! ## Ownership and lifetimes
//! The tracker owns its policy copy; it is embedded by value in the session
//! machine and never shared.
//!
//! ## Error model
//! Invalid policy configuration (zero threshold, malformed JSON) returns
//! [`PolicyError`]. Recording never fails.
//!
//! ## Security and privacy notes
//! Kind does not change escalation speed: any mix of kinds reaches the
//! threshold equally fast.

use proctor_core::ViolationKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Two strikes: one warning, then termination.
pub const DEFAULT_VIOLATION_THRESHOLD: u32 = 2;

/// Default warning for leaving fullscreen.
pub const DEFAULT_FULLSCREEN_WARNING: &str =
    "You must stay in fullscreen. This is your final warning.";

/// Default warning for hiding the page.
pub const DEFAULT_TAB_WARNING: &str = "Tab switching is not allowed. This is your final warning.";

/// Escalation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationPolicy {
    /// Violation count that terminates the interview.
    pub threshold: u32,
    /// Warning shown after a fullscreen exit below the threshold.
    #[serde(default = "default_fullscreen_warning")]
    pub fullscreen_warning: String,
    /// Warning shown after a tab hide below the threshold.
    #[serde(default = "default_tab_warning")]
    pub tab_warning: String,
}

fn default_fullscreen_warning() -> String {
    DEFAULT_FULLSCREEN_WARNING.to_string()
}

fn default_tab_warning() -> String {
    DEFAULT_TAB_WARNING.to_string()
}

impl EscalationPolicy {
    /// Creates a policy with default warnings and the given threshold.
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidThreshold`] when `threshold == 0`.
    pub fn with_threshold(threshold: u32) -> Result<Self, PolicyError> {
        let policy = Self {
            threshold,
            ..Self::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Parses a policy from JSON and validates it.
    ///
    /// # Errors
    /// Returns [`PolicyError::Decode`] for malformed JSON and
    /// [`PolicyError::InvalidThreshold`] for a zero threshold.
    pub fn from_json(raw: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_json::from_str(raw).map_err(PolicyError::Decode)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Checks policy invariants.
    ///
    /// # Errors
    /// Returns [`PolicyError::InvalidThreshold`] when `threshold == 0`.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.threshold == 0 {
            return Err(PolicyError::InvalidThreshold);
        }
        Ok(())
    }

    /// Warning text for a kind.
    pub fn warning_for(&self, kind: ViolationKind) -> &str {
        match kind {
            ViolationKind::FullscreenExit => &self.fullscreen_warning,
            ViolationKind::TabHidden => &self.tab_warning,
        }
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_VIOLATION_THRESHOLD,
            fullscreen_warning: default_fullscreen_warning(),
            tab_warning: default_tab_warning(),
        }
    }
}

/// Outcome of recording one violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationDecision {
    /// Below threshold: surface a warning and continue.
    Warn {
        /// Triggering kind.
        kind: ViolationKind,
        /// Count after this event.
        count: u32,
        /// Kind-specific warning text.
        message: String,
    },
    /// Threshold reached: end the interview.
    Terminate {
        /// Triggering kind.
        kind: ViolationKind,
        /// Count after this event (equals the threshold).
        count: u32,
    },
    /// Tracker already terminated; the event was not counted.
    Ignored,
}

/// Counts violations and applies the escalation policy.
#[derive(Debug, Clone)]
pub struct ViolationTracker {
    policy: EscalationPolicy,
    count: u32,
    sealed: bool,
}

impl ViolationTracker {
    /// Creates a tracker at zero.
    pub fn new(policy: EscalationPolicy) -> Self {
        Self {
            policy,
            count: 0,
            sealed: false,
        }
    }

    /// Violations counted so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Configured threshold.
    pub fn threshold(&self) -> u32 {
        self.policy.threshold
    }

    /// Returns `true` once the threshold was reached.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Stops counting without a terminate decision (session ended another way).
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Records one violation and returns the escalation decision.
    pub fn record(&mut self, kind: ViolationKind) -> EscalationDecision {
        if self.sealed {
            return EscalationDecision::Ignored;
        }

        self.count = self.count.saturating_add(1);
        if self.count >= self.policy.threshold {
            self.sealed = true;
            return EscalationDecision::Terminate {
                kind,
                count: self.count,
            };
        }

        EscalationDecision::Warn {
            kind,
            count: self.count,
            message: self.policy.warning_for(kind).to_string(),
        }
    }
}

/// Policy errors.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// JSON decode failure.
    #[error("policy decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Threshold must be strictly positive.
    #[error("violation threshold must be greater than zero")]
    InvalidThreshold,
}
