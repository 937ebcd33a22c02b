//! AuthBridge: one bounded authentication transaction per broker request.
//!
//! # Transaction
//!
//! ```text
//! Received
//!   ├─ requestId seen within the TTL     -> dropped, nothing published
//!   ├─ another transaction in flight     -> Error status + response "busy",
//!   │                                       device untouched, id not remembered
//!   └─ Initializing ── prepare device ── Scanning ── detect ──┐
//!                     (both bounded by one detect timeout)   │
//!        {Success | Failed | Error} status, then response  <─┘
//!        release device (always, exactly once)
//! ```
//!
//! Status updates are published in that order.  If preparing the device
//! fails, `Scanning` is never published and the terminal status follows
//! `Initializing` directly.  A panic inside the detection calls is caught
//! and ends the transaction in Error like any other failure.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::FutureExt;
use faceauth_core::{
    AuthRequest, AuthResponse, AuthStatus, LoopSummary, ReleaseStatus, ScanRequest, StatusUpdate,
};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::verdict::{MSG_INITIALIZING, MSG_READY, MSG_SCANNING};
use crate::domain::{RecentRequests, ScanSettings, Verdict};

/// Failures of the detection service call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundaryError {
    /// The service answered with a non-success status code.
    #[error("Face detection API error: {status}")]
    Api { status: u16 },

    /// The service could not be reached or its reply could not be read.
    #[error("Face detection error: {0}")]
    Transport(String),
}

/// Why a transaction ended in the Error state.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Face authentication busy")]
    Busy,

    #[error("Face detection timeout")]
    DetectionTimeout,

    /// A detection call panicked.
    #[error("Face detection error: unexpected failure")]
    Unexpected,

    #[error(transparent)]
    Boundary(#[from] BoundaryError),
}

#[derive(Debug, Error)]
#[error("publish failed: {0}")]
pub struct PublishError(pub String);

/// The synchronous detection call, as seen from the bridge.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DetectionBoundary: Send + Sync {
    /// Opens (or reuses) the camera.
    async fn prepare_device(&self) -> Result<(), BoundaryError>;

    /// Runs one scan to completion.
    async fn detect(&self, request: &ScanRequest) -> Result<LoopSummary, BoundaryError>;

    /// Closes the camera.  Idempotent.
    async fn release_device(&self) -> Result<ReleaseStatus, BoundaryError>;
}

/// Where status updates and responses go.
#[async_trait]
pub trait AuthPublisher: Send + Sync {
    async fn publish_status(&self, update: &StatusUpdate) -> Result<(), PublishError>;
    async fn publish_response(&self, response: &AuthResponse) -> Result<(), PublishError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeTimeouts {
    /// Bound on preparing the device plus the whole scan.
    pub detect: Duration,
    /// Bound on the release call.
    pub release: Duration,
}

impl From<&ScanSettings> for BridgeTimeouts {
    fn from(settings: &ScanSettings) -> Self {
        Self {
            detect: settings.detect_timeout(),
            release: settings.release_timeout(),
        }
    }
}

pub struct AuthBridge {
    boundary: Arc<dyn DetectionBoundary>,
    publisher: Arc<dyn AuthPublisher>,
    scan: ScanRequest,
    timeouts: BridgeTimeouts,
    in_flight: tokio::sync::Mutex<()>,
    recent: Mutex<RecentRequests>,
}

impl AuthBridge {
    pub fn new(
        boundary: Arc<dyn DetectionBoundary>,
        publisher: Arc<dyn AuthPublisher>,
        settings: &ScanSettings,
    ) -> Self {
        Self {
            boundary,
            publisher,
            scan: settings.to_scan_request(),
            timeouts: BridgeTimeouts::from(settings),
            in_flight: tokio::sync::Mutex::new(()),
            recent: Mutex::new(RecentRequests::new(
                settings.dedup_ttl(),
                settings.dedup_capacity,
            )),
        }
    }

    pub fn with_timeouts(mut self, timeouts: BridgeTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Publishes the `ready` status.  Called whenever the broker connection
    /// is (re)established.
    pub async fn announce_ready(&self) {
        self.publish_status(StatusUpdate::new(AuthStatus::Ready, MSG_READY))
            .await;
    }

    /// Handles one request end to end.
    ///
    /// Returns the published response, or `None` when the request was a
    /// redelivery and was dropped.
    #[instrument(skip_all, fields(request_id = %request.request_id))]
    pub async fn handle_request(&self, request: AuthRequest) -> Option<AuthResponse> {
        if self.seen_recently(&request.request_id) {
            warn!("duplicate request dropped");
            return None;
        }

        // A busy rejection is not remembered, so the client may retry the id.
        let Ok(_in_flight) = self.in_flight.try_lock() else {
            return Some(self.reject_busy(&request).await);
        };

        if !self.remember(&request.request_id) {
            warn!("duplicate request dropped");
            return None;
        }

        Some(self.run_transaction(&request).await)
    }

    async fn reject_busy(&self, request: &AuthRequest) -> AuthResponse {
        warn!("rejected: another authentication is in progress");
        let error = BridgeError::Busy.to_string();
        let response = AuthResponse::rejected(&request.request_id, error.as_str());
        self.publish_status(StatusUpdate::new(AuthStatus::Error, error))
            .await;
        self.publish_response(&response).await;
        response
    }

    async fn run_transaction(&self, request: &AuthRequest) -> AuthResponse {
        info!(user_id = %request.user_id, "authentication started");
        self.publish_status(StatusUpdate::new(AuthStatus::Initializing, MSG_INITIALIZING))
            .await;

        let scan = AssertUnwindSafe(self.prepare_and_detect()).catch_unwind();
        let outcome = tokio::time::timeout(self.timeouts.detect, scan).await;
        let verdict = match outcome {
            Ok(Ok(Ok(summary))) => {
                debug!(
                    frames = summary.frames_processed,
                    stop_reason = ?summary.stop_reason,
                    "scan completed"
                );
                Verdict::from_summary(&summary)
            }
            Ok(Ok(Err(e))) => Verdict::Error(BridgeError::from(e).to_string()),
            Ok(Err(panic)) => {
                error!("detection panicked: {}", panic_message(&*panic));
                Verdict::Error(BridgeError::Unexpected.to_string())
            }
            Err(_) => Verdict::Error(BridgeError::DetectionTimeout.to_string()),
        };

        let response = verdict.response(&request.request_id);
        self.publish_status(verdict.status_update()).await;
        self.publish_response(&response).await;
        self.release_device().await;

        info!(status = ?verdict.status(), "authentication finished");
        response
    }

    async fn prepare_and_detect(&self) -> Result<LoopSummary, BoundaryError> {
        self.boundary.prepare_device().await?;
        self.publish_status(StatusUpdate::new(AuthStatus::Scanning, MSG_SCANNING))
            .await;
        self.boundary.detect(&self.scan).await
    }

    async fn release_device(&self) {
        let release = AssertUnwindSafe(self.boundary.release_device()).catch_unwind();
        match tokio::time::timeout(self.timeouts.release, release).await {
            Ok(Ok(Ok(status))) => debug!(?status, "camera released"),
            Ok(Ok(Err(e))) => warn!("camera release failed: {e}"),
            Ok(Err(panic)) => error!("camera release panicked: {}", panic_message(&*panic)),
            Err(_) => warn!("camera release timed out"),
        }
    }

    fn seen_recently(&self, request_id: &str) -> bool {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(request_id, Instant::now())
    }

    /// Returns `false` if the id was seen recently.
    fn remember(&self, request_id: &str) -> bool {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request_id, Instant::now())
    }

    async fn publish_status(&self, update: StatusUpdate) {
        if let Err(e) = self.publisher.publish_status(&update).await {
            warn!("status {:?} not published: {e}", update.status);
        }
    }

    async fn publish_response(&self, response: &AuthResponse) {
        if let Err(e) = self.publisher.publish_response(response).await {
            warn!("response not published: {e}");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
