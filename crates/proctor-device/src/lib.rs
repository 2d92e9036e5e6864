#![warn(missing_docs)]
//! # proctor-device
//!
//! ## Purpose
//! Provides the camera capture abstraction used for candidate monitoring.
//!
//! ## Responsibilities
//! - Define a backend-agnostic [`CameraBackend`] trait over the host media API.
//! - Wrap it in a [`DeviceMonitor`] that hands out [`StreamHandle`] values and
//!   releases them idempotently.
//! - Expose a deterministic [`SyntheticCamera`] for CI, replay and unit tests.
//!
//! ## Data flow
//! Session controller calls [`DeviceMonitor::acquire`] during briefing ->
//! backend opens the stream -> controller keeps the handle -> any exit from the
//! active phase calls [`DeviceMonitor::release`].
//!
//! ## Ownership and lifetimes
//! The controller owns the [`StreamHandle`]. The monitor never retains a copy,
//! so release is driven solely by the owner.
//!
//! ## Error model
//! Permission refusal and missing hardware are reported as [`DeviceError`]
//! values. The caller decides whether they block anything; the interview
//! controller treats them as advisory.
//!
//! ## Security and privacy notes
//! No frame data passes through this crate; it manages stream lifetime only.

use std::sync::{Arc, Mutex};

use thiserror::Error;

/// One live media track inside a camera stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTrack {
    /// Backend track identifier.
    pub id: String,
    /// Track kind, `video` for cameras.
    pub kind: String,
}

/// Tracks opened by a backend for one stream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedStream {
    /// Backend stream identifier.
    pub stream_id: String,
    /// Tracks belonging to the stream.
    pub tracks: Vec<MediaTrack>,
}

/// Trait implemented by concrete camera providers.
pub trait CameraBackend: Send + Sync {
    /// Requests camera access and opens a video stream.
    ///
    /// # Errors
    /// Returns [`DeviceError::PermissionDenied`] when the user refuses access
    /// and [`DeviceError::DeviceUnavailable`] when no camera can be opened.
    fn open_stream(&self) -> Result<OpenedStream, DeviceError>;

    /// Stops one track. Stopping an already-stopped track must be harmless.
    fn stop_track(&self, track: &MediaTrack);
}

/// Owned handle to an acquired camera stream.
///
/// A default handle was never acquired; releasing it does nothing.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StreamHandle {
    stream_id: Option<String>,
    tracks: Vec<MediaTrack>,
    released: bool,
}

impl StreamHandle {
    /// Handle that stands for a failed or skipped acquisition.
    pub fn unacquired() -> Self {
        Self::default()
    }

    /// Backend stream identifier, if the stream was acquired.
    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref()
    }

    /// Returns `true` while the stream holds tracks that have not been stopped.
    pub fn is_live(&self) -> bool {
        self.stream_id.is_some() && !self.released
    }

    /// Number of tracks in the stream.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

/// Camera capability provider. Acquires and releases streams; owns no policy.
#[derive(Clone)]
pub struct DeviceMonitor {
    backend: Arc<dyn CameraBackend>,
}

impl DeviceMonitor {
    /// Creates a monitor over a backend.
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        Self { backend }
    }

    /// Opens a camera stream.
    ///
    /// # Errors
    /// Propagates [`DeviceError`] from the backend unchanged.
    pub fn acquire(&self) -> Result<StreamHandle, DeviceError> {
        let opened = self.backend.open_stream()?;
        tracing::debug!(
            stream_id = %opened.stream_id,
            tracks = opened.tracks.len(),
            "camera stream acquired"
        );
        Ok(StreamHandle {
            stream_id: Some(opened.stream_id),
            tracks: opened.tracks,
            released: false,
        })
    }

    /// Stops every track in the handle.
    ///
    /// # Side effects
    /// Marks the handle released. Later calls, and calls on an unacquired
    /// handle, do nothing.
    pub fn release(&self, handle: &mut StreamHandle) {
        if !handle.is_live() {
            return;
        }
        for track in &handle.tracks {
            self.backend.stop_track(track);
        }
        handle.released = true;
        tracing::debug!(stream_id = ?handle.stream_id, "camera stream released");
    }
}

/// Scripted camera outcome for [`SyntheticCamera`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticOutcome {
    /// Opening succeeds with the given number of video tracks.
    Grant {
        /// Tracks per opened stream.
        tracks: usize,
    },
    /// User refuses camera access.
    Deny,
    /// No camera hardware.
    Unavailable,
}

/// Deterministic backend for test and CI usage.
#[derive(Debug)]
pub struct SyntheticCamera {
    outcome: SyntheticOutcome,
    state: Mutex<SyntheticState>,
}

#[derive(Debug, Default)]
struct SyntheticState {
    opened: u64,
    stopped: Vec<String>,
}

impl SyntheticCamera {
    /// Creates a camera that grants one video track per stream.
    pub fn new() -> Self {
        Self::with_outcome(SyntheticOutcome::Grant { tracks: 1 })
    }

    /// Creates a camera with a scripted outcome.
    pub fn with_outcome(outcome: SyntheticOutcome) -> Self {
        Self {
            outcome,
            state: Mutex::new(SyntheticState::default()),
        }
    }

    /// Number of `open_stream` calls that produced a stream.
    pub fn opened_streams(&self) -> u64 {
        self.state.lock().map(|state| state.opened).unwrap_or(0)
    }

    /// Track ids passed to `stop_track`, in call order.
    pub fn stopped_tracks(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.stopped.clone())
            .unwrap_or_default()
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for SyntheticCamera {
    fn open_stream(&self) -> Result<OpenedStream, DeviceError> {
        let tracks = match self.outcome {
            SyntheticOutcome::Grant { tracks } => tracks,
            SyntheticOutcome::Deny => return Err(DeviceError::PermissionDenied),
            SyntheticOutcome::Unavailable => {
                return Err(DeviceError::DeviceUnavailable(
                    "synthetic camera has no device".to_string(),
                ));
            }
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| DeviceError::Backend("synthetic camera lock poisoned".to_string()))?;
        state.opened += 1;
        let stream_id = format!("synthetic-stream-{}", state.opened);

        Ok(OpenedStream {
            tracks: (0..tracks)
                .map(|index| MediaTrack {
                    id: format!("{stream_id}-video-{index}"),
                    kind: "video".to_string(),
                })
                .collect(),
            stream_id,
        })
    }

    fn stop_track(&self, track: &MediaTrack) {
        if let Ok(mut state) = self.state.lock() {
            state.stopped.push(track.id.clone());
        }
    }
}

/// Device layer error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// User refused camera access.
    #[error("camera permission denied")]
    PermissionDenied,
    /// No usable camera.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
    /// Backend runtime failure.
    #[error("camera backend failure: {0}")]
    Backend(String),
}
