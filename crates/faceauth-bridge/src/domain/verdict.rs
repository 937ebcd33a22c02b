//! How a transaction outcome becomes a terminal status and a response.

use faceauth_core::{AuthResponse, AuthStatus, LoopSummary, StatusUpdate, StopReason};

/// Fixed confidence reported with every positive result.
pub const MATCH_CONFIDENCE: f64 = 0.95;

pub const MSG_READY: &str = "Face authentication service ready";
pub const MSG_INITIALIZING: &str = "Initializing camera, please wait...";
pub const MSG_SCANNING: &str = "Camera ready! Please look at the camera for face authentication...";
pub const MSG_NO_MATCH: &str = "No recognized face detected";

/// Terminal outcome of one authentication transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// A known identity was seen; the first in discovery order wins.
    Recognized(String),
    /// The scan completed without recognising anyone.
    NoMatch,
    /// The transaction could not complete; carries the error text.
    Error(String),
}

impl Verdict {
    /// Reads a completed scan.
    ///
    /// A capture failure before any frame was processed means the camera never
    /// delivered anything, which is an error rather than a negative result.
    pub fn from_summary(summary: &LoopSummary) -> Self {
        if let Some(label) = summary.first_positive_label() {
            return Verdict::Recognized(label.to_string());
        }
        if summary.stop_reason == StopReason::CaptureFailure && summary.frames_processed == 0 {
            return Verdict::Error("Face detection error: camera produced no frames".to_string());
        }
        Verdict::NoMatch
    }

    pub fn status(&self) -> AuthStatus {
        match self {
            Verdict::Recognized(_) => AuthStatus::Success,
            Verdict::NoMatch => AuthStatus::Failed,
            Verdict::Error(_) => AuthStatus::Error,
        }
    }

    /// The terminal status update matching this verdict.
    pub fn status_update(&self) -> StatusUpdate {
        let message = match self {
            Verdict::Recognized(label) => format!("Face recognized: {label}"),
            Verdict::NoMatch => MSG_NO_MATCH.to_string(),
            Verdict::Error(error) => error.clone(),
        };
        StatusUpdate::new(self.status(), message)
    }

    pub fn response(&self, request_id: &str) -> AuthResponse {
        match self {
            Verdict::Recognized(label) => {
                AuthResponse::authenticated(request_id, label, MATCH_CONFIDENCE)
            }
            Verdict::NoMatch => AuthResponse::rejected(request_id, MSG_NO_MATCH),
            Verdict::Error(error) => AuthResponse::rejected(request_id, error.as_str()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
