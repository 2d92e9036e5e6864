//! Shared fixtures for session controller integration tests.

use std::sync::Arc;

use proctor_core::SubmissionRequest;
use proctor_device::{DeviceMonitor, SyntheticCamera, SyntheticOutcome};
use proctor_guards::{FormFactor, FullscreenGuard, SyntheticFullscreen, VisibilityGuard};
use proctor_session::{InMemorySessionStore, Providers, SessionConfig, SessionController};
use proctor_submit::{RecordingTransport, SubmissionClient};

/// Session id used by every fixture.
#[allow(dead_code)]
pub const SESSION_ID: &str = "session-xyz";

/// Synthetic providers plus handles for inspecting them.
#[allow(dead_code)]
pub struct Harness {
    pub camera: Arc<SyntheticCamera>,
    pub fullscreen_host: Arc<SyntheticFullscreen>,
    pub fullscreen: Arc<FullscreenGuard>,
    pub visibility: Arc<VisibilityGuard>,
    pub transport: Arc<RecordingTransport>,
    pub store: Arc<InMemorySessionStore>,
}

#[allow(dead_code)]
impl Harness {
    /// Desktop harness with a granting camera, granting fullscreen host and an
    /// accepting transport.
    pub fn desktop() -> Self {
        Self::build(
            FormFactor::Desktop,
            SyntheticOutcome::Grant { tracks: 1 },
            RecordingTransport::new(),
        )
    }

    /// Mobile harness.
    pub fn mobile() -> Self {
        Self::build(
            FormFactor::Mobile,
            SyntheticOutcome::Grant { tracks: 1 },
            RecordingTransport::new(),
        )
    }

    /// Harness with explicit camera outcome and transport.
    pub fn build(
        form_factor: FormFactor,
        camera_outcome: SyntheticOutcome,
        transport: RecordingTransport,
    ) -> Self {
        let fullscreen_host = Arc::new(SyntheticFullscreen::new(true));
        Self {
            camera: Arc::new(SyntheticCamera::with_outcome(camera_outcome)),
            fullscreen: Arc::new(FullscreenGuard::new(fullscreen_host.clone(), form_factor)),
            fullscreen_host,
            visibility: Arc::new(VisibilityGuard::new()),
            transport: Arc::new(transport),
            store: Arc::new(InMemorySessionStore::new()),
        }
    }

    /// Providers wired to the synthetic components.
    pub fn providers(&self) -> Providers {
        Providers {
            camera: DeviceMonitor::new(self.camera.clone()),
            fullscreen: self.fullscreen.clone(),
            visibility: self.visibility.clone(),
            submitter: SubmissionClient::new("https://api.example.test", self.transport.clone())
                .expect("fixture endpoint is valid"),
            store: self.store.clone(),
        }
    }

    /// Stores `count` questions and returns a loaded controller in `Briefing`.
    pub fn loaded(&self, count: usize) -> SessionController {
        let questions = (0..count).map(|index| format!("Problem {index}")).collect();
        self.store.insert(SESSION_ID, questions);
        let mut controller =
            SessionController::new(SESSION_ID, SessionConfig::default(), self.providers());
        controller.load().expect("fixture questions load");
        controller
    }

    /// Returns a controller already in `Active`.
    pub fn started(&self, count: usize) -> SessionController {
        let mut controller = self.loaded(count);
        controller.start(0).expect("fixture start succeeds");
        controller
    }

    /// Decoded bodies of every submission sent.
    pub fn sent_requests(&self) -> Vec<SubmissionRequest> {
        self.transport
            .sent()
            .iter()
            .map(|envelope| {
                SubmissionRequest::from_json_bytes(&envelope.body).expect("body decodes")
            })
            .collect()
    }
}
