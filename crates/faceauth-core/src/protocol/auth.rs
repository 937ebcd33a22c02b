//! Broker payloads for the authentication exchange.
//!
//! ```text
//! request  topic: {"userId":"alice","requestId":"r-1"}
//! status   topic: {"status":"scanning","message":"...","timestamp":1700000000.5}
//! response topic: {"success":true,"requestId":"r-1","userId":"alice",
//!                  "confidence":0.95,"timestamp":1700000003.1,"message":"Welcome, alice!"}
//! ```
//!
//! Optional response fields are omitted from the JSON when absent rather than
//! sent as `null`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{epoch_seconds, ProtocolError};

/// Topic the bridge subscribes to for inbound requests.
pub const TOPIC_REQUEST: &str = "home/auth/face/request";
/// Topic the bridge publishes terminal responses on.
pub const TOPIC_RESPONSE: &str = "home/auth/face/response";
/// Topic the bridge publishes progress updates on.
pub const TOPIC_STATUS: &str = "home/auth/face/status";

/// `userId` recorded when a request does not name one.
pub const ANONYMOUS_USER: &str = "unknown";

/// Raw request object as published by the app.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthRequestPayload {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
}

/// One authentication attempt.  Immutable once received.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthRequest {
    /// Correlates the request with its status stream and response.
    pub request_id: String,
    /// The user the app claims to be authenticating (informational).
    pub user_id: String,
    /// Epoch seconds at which the bridge received the message.
    pub received_at: f64,
}

impl AuthRequest {
    /// Builds a request with explicit identifiers, stamped with the current time.
    pub fn new(request_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            user_id: user_id.into(),
            received_at: epoch_seconds(),
        }
    }

    /// Decodes a request from a broker message body.
    ///
    /// A missing `requestId` is replaced with a freshly generated UUID and a
    /// missing `userId` with [`ANONYMOUS_USER`], so every well-formed JSON
    /// object yields a usable request.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] when the body is not a JSON object.
    pub fn from_payload(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let payload: AuthRequestPayload = serde_json::from_slice(bytes)?;
        let request_id = payload
            .request_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let user_id = payload
            .user_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS_USER.to_string());
        Ok(Self {
            request_id,
            user_id,
            received_at: epoch_seconds(),
        })
    }
}

/// Progress states published on the status topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// The bridge is connected and accepting requests.
    Ready,
    /// The camera is being opened.
    Initializing,
    /// The camera is open and frames are being matched.
    Scanning,
    /// A known face was recognised.
    Success,
    /// The scan completed without recognising anyone.
    Failed,
    /// The transaction could not complete (device, transport, timeout).
    Error,
}

impl AuthStatus {
    /// Returns `true` for the states that end a transaction.
    pub fn is_terminal(self) -> bool {
        matches!(self, AuthStatus::Success | AuthStatus::Failed | AuthStatus::Error)
    }
}

/// A single progress signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: AuthStatus,
    pub message: String,
    pub timestamp: f64,
}

impl StatusUpdate {
    /// Builds an update stamped with the current time.
    pub fn new(status: AuthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            timestamp: epoch_seconds(),
        }
    }
}

/// The terminal result of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthResponse {
    /// A positive result naming the recognised identity.
    pub fn authenticated(request_id: impl Into<String>, label: &str, confidence: f64) -> Self {
        Self {
            success: true,
            request_id: request_id.into(),
            user_id: Some(label.to_string()),
            confidence: Some(confidence),
            error: None,
            timestamp: epoch_seconds(),
            message: Some(format!("Welcome, {label}!")),
        }
    }

    /// A negative result carrying the reason.
    pub fn rejected(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: request_id.into(),
            user_id: None,
            confidence: None,
            error: Some(error.into()),
            timestamp: epoch_seconds(),
            message: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
