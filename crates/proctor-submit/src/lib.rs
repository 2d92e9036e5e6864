#![warn(missing_docs)]
//! # proctor-submit
//!
//! ## Purpose
//! Implements the client side of the interview submission endpoint.
//!
//! ## Responsibilities
//! - Validate the submission base URL policy (HTTPS, loopback HTTP for dev).
//! - Build the per-session endpoint `/api/interview/submit/<sessionId>`.
//! - Derive a stable idempotency key from the serialized request.
//! - Send envelopes through an injectable [`SubmissionTransport`].
//! - Classify failures as retriable or permanent for user messaging.
//!
//! ## Data flow
//! Session controller freezes answers into a [`SubmissionRequest`] ->
//! [`SubmissionClient::submit`] builds a [`SubmissionEnvelope`] -> transport
//! sends it -> success or [`SubmitError`] is fed back to the controller.
//!
//! ## Ownership and lifetimes
//! Envelopes own their body bytes so a failed submission can be resent
//! verbatim on manual retry.
//!
//! ## Error model
//! Endpoint policy violations and transport failures surface as
//! [`SubmitError`]. This crate never retries on its own.
//!
//! ## Security and privacy notes
//! Request bodies contain candidate answers; this crate logs only endpoint,
//! key and byte length.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use proctor_core::{CoreError, SubmissionRequest};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Path segments of the submission route, before the session id.
pub const SUBMIT_ROUTE: [&str; 3] = ["api", "interview", "submit"];

const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

/// One outbound submission call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionEnvelope {
    /// Absolute endpoint URL.
    pub endpoint: String,
    /// Stable key for server-side de-duplication.
    pub idempotency_key: String,
    /// JSON request body.
    pub body: Vec<u8>,
}

/// Result of one successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Endpoint that accepted the request.
    pub endpoint: String,
    /// Key sent with the request.
    pub idempotency_key: String,
}

/// Abstract transport used by the submission client.
pub trait SubmissionTransport: Send + Sync {
    /// POSTs the envelope body to its endpoint.
    ///
    /// # Errors
    /// Returns [`SubmitError`] for network or non-success HTTP outcomes.
    fn send(&self, envelope: &SubmissionEnvelope) -> Result<(), SubmitError>;
}

/// Submission client with validated base URL.
#[derive(Clone)]
pub struct SubmissionClient {
    base_url: Url,
    transport: Arc<dyn SubmissionTransport>,
}

impl SubmissionClient {
    /// Creates a validated client.
    ///
    /// # Errors
    /// Returns [`SubmitError::InvalidEndpoint`] when the URL does not parse,
    /// is not HTTPS (HTTP is accepted for loopback hosts only), or cannot
    /// carry path segments.
    pub fn new(
        base_url: impl AsRef<str>,
        transport: Arc<dyn SubmissionTransport>,
    ) -> Result<Self, SubmitError> {
        let base_url = validate_submit_base_url(base_url.as_ref())?;
        Ok(Self {
            base_url,
            transport,
        })
    }

    /// Returns configured base URL.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Builds the endpoint for one session.
    ///
    /// # Errors
    /// Returns [`SubmitError::InvalidEndpoint`] when the base URL cannot be a
    /// path base.
    pub fn endpoint_for(&self, session_id: &str) -> Result<String, SubmitError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SubmitError::InvalidEndpoint("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(SUBMIT_ROUTE)
            .push(session_id);
        Ok(url.into())
    }

    /// Builds the envelope for a request without sending it.
    ///
    /// # Errors
    /// Returns [`SubmitError::Encode`] when the body cannot be serialized and
    /// [`SubmitError::InvalidEndpoint`] when the endpoint cannot be built.
    pub fn envelope(&self, request: &SubmissionRequest) -> Result<SubmissionEnvelope, SubmitError> {
        let body = request.to_json_bytes().map_err(SubmitError::Encode)?;
        Ok(SubmissionEnvelope {
            endpoint: self.endpoint_for(&request.session_id)?,
            idempotency_key: idempotency_key_for_body(&body),
            body,
        })
    }

    /// Sends one submission.
    ///
    /// # Errors
    /// Propagates envelope construction and transport errors as-is; the
    /// caller decides whether to offer a retry.
    pub fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionReceipt, SubmitError> {
        let envelope = self.envelope(request)?;
        tracing::info!(
            endpoint = %envelope.endpoint,
            idempotency_key = %envelope.idempotency_key,
            body_len = envelope.body.len(),
            "sending interview submission"
        );
        self.transport.send(&envelope)?;
        Ok(SubmissionReceipt {
            endpoint: envelope.endpoint,
            idempotency_key: envelope.idempotency_key,
        })
    }
}

/// Validates and parses a submission base URL.
///
/// # Errors
/// Returns [`SubmitError::InvalidEndpoint`] for unparsable, non-HTTPS
/// non-loopback, or non-hierarchical URLs.
pub fn validate_submit_base_url(base_url: &str) -> Result<Url, SubmitError> {
    let parsed = Url::parse(base_url)
        .map_err(|error| SubmitError::InvalidEndpoint(format!("invalid submit url: {error}")))?;

    match parsed.scheme() {
        "https" => {}
        "http" if is_loopback(&parsed) => {}
        _ => {
            return Err(SubmitError::InvalidEndpoint(
                "submit endpoint must use https outside loopback".to_string(),
            ));
        }
    }

    if parsed.cannot_be_a_base() {
        return Err(SubmitError::InvalidEndpoint(
            "submit endpoint must be a hierarchical url".to_string(),
        ));
    }

    Ok(parsed)
}

fn is_loopback(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| LOOPBACK_HOSTS.contains(&host))
}

/// Stable idempotency key for a request: SHA-256 hex of its JSON body.
///
/// # Errors
/// Returns [`SubmitError::Encode`] when the request cannot be serialized.
pub fn idempotency_key_for_request(request: &SubmissionRequest) -> Result<String, SubmitError> {
    let body = request.to_json_bytes().map_err(SubmitError::Encode)?;
    Ok(idempotency_key_for_body(&body))
}

fn idempotency_key_for_body(body: &[u8]) -> String {
    hex::encode(Sha256::digest(body))
}

/// Whether retrying a failed submission may help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Network blip or server-side failure.
    Retriable,
    /// Request rejected or locally invalid.
    Permanent,
}

/// Classifies a submission failure.
pub fn classify_submit_error(error: &SubmitError) -> FailureClass {
    match error {
        SubmitError::Timeout | SubmitError::Connection(_) | SubmitError::Server(_) => {
            FailureClass::Retriable
        }
        SubmitError::Client(408 | 429) => FailureClass::Retriable,
        SubmitError::Client(_)
        | SubmitError::InvalidEndpoint(_)
        | SubmitError::Encode(_)
        | SubmitError::Transport(_) => FailureClass::Permanent,
    }
}

/// In-memory transport that records envelopes and replays scripted outcomes.
///
/// Each `send` pops the next scripted outcome; an empty script means success.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<SubmissionEnvelope>>,
    script: Mutex<VecDeque<Result<(), SubmitError>>>,
}

impl RecordingTransport {
    /// Creates a transport that accepts every envelope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that answers with `outcomes` in order, then succeeds.
    pub fn scripted(outcomes: impl IntoIterator<Item = Result<(), SubmitError>>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            script: Mutex::new(outcomes.into_iter().collect()),
        }
    }

    /// Appends one scripted outcome.
    pub fn push_outcome(&self, outcome: Result<(), SubmitError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
    }

    /// Envelopes seen so far, in send order.
    pub fn sent(&self) -> Vec<SubmissionEnvelope> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Number of `send` calls.
    pub fn call_count(&self) -> usize {
        self.sent.lock().map(|sent| sent.len()).unwrap_or(0)
    }
}

impl SubmissionTransport for RecordingTransport {
    fn send(&self, envelope: &SubmissionEnvelope) -> Result<(), SubmitError> {
        self.sent
            .lock()
            .map_err(|_| SubmitError::Transport("recording lock poisoned".to_string()))?
            .push(envelope.clone());

        self.script
            .lock()
            .map_err(|_| SubmitError::Transport("script lock poisoned".to_string()))?
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

/// Errors produced by the submission client.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Endpoint violates security or routing requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Request body could not be serialized.
    #[error("submission encode failure: {0}")]
    Encode(CoreError),
    /// Request timed out.
    #[error("submission timed out")]
    Timeout,
    /// Network connection failure.
    #[error("submission connection failure: {0}")]
    Connection(String),
    /// Server answered with a 5xx status.
    #[error("submission rejected by server with status {0}")]
    Server(u16),
    /// Server answered with a 4xx status.
    #[error("submission rejected as invalid with status {0}")]
    Client(u16),
    /// Other transport failure.
    #[error("submission transport failure: {0}")]
    Transport(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for endpoint policy and keys.

    use super::*;

    fn request() -> SubmissionRequest {
        SubmissionRequest {
            session_id: "session-1".to_string(),
            answers: vec!["a".to_string()],
            duration_seconds: 12,
            auto_submitted: false,
            reason: None,
        }
    }

    #[test]
    fn validates_expected_endpoint_policy() {
        validate_submit_base_url("https://api.example.test").expect("https should pass");
        validate_submit_base_url("http://localhost:3000").expect("loopback http should pass");
        assert!(validate_submit_base_url("http://api.example.test").is_err());
        assert!(validate_submit_base_url("mailto:ops@example.test").is_err());
    }

    #[test]
    fn endpoint_appends_route_and_session() {
        let client = SubmissionClient::new(
            "https://api.example.test/",
            Arc::new(RecordingTransport::new()),
        )
        .expect("client should build");
        assert_eq!(
            client.endpoint_for("abc").expect("endpoint builds"),
            "https://api.example.test/api/interview/submit/abc"
        );
    }

    #[test]
    fn idempotency_key_is_stable_and_body_sensitive() {
        let first = idempotency_key_for_request(&request()).expect("key builds");
        let second = idempotency_key_for_request(&request()).expect("key builds");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);

        let mut changed = request();
        changed.duration_seconds += 1;
        assert_ne!(first, idempotency_key_for_request(&changed).expect("key builds"));
    }
}
