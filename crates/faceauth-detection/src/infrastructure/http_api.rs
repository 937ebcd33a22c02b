//! HTTP detection API (axum).
//!
//! | Route                 | Success                          | Errors              |
//! |-----------------------|----------------------------------|---------------------|
//! | `GET /healthz`        | `{"ok":true}`                    |                     |
//! | `POST /camera/acquire`| `{"status":"ready"}`             | 503                 |
//! | `POST /camera/release`| `{"status":...,"message":...}`   |                     |
//! | `POST /detect-webcam` | `LoopSummary`                    | 400, 409, 503, 500  |
//!
//! Every error body is `{"error": "<text>"}`.  Device and detection work
//! blocks, so handlers move it onto the blocking pool.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use faceauth_core::protocol::ErrorBody;
use faceauth_core::{LoopSummary, ReleaseOutcome, ScanRequest};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::application::detection_service::{DetectionService, ScanError};
use crate::application::device_session::DeviceError;

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn status_for(err: &ScanError) -> StatusCode {
    match err {
        ScanError::InvalidRequest(_) | ScanError::Enrollment(_) => StatusCode::BAD_REQUEST,
        ScanError::Device(DeviceError::Busy) => StatusCode::CONFLICT,
        ScanError::Device(DeviceError::DeviceUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        ScanError::Detector(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn router(service: Arc<DetectionService>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/camera/acquire", post(acquire_camera))
        .route("/camera/release", post(release_camera))
        .route("/detect-webcam", post(detect_webcam))
        .with_state(service)
}

/// Serves the API on `listener` until `shutdown` completes.
pub async fn serve(
    listener: TcpListener,
    service: Arc<DetectionService>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr().context("listener has no local address")?;
    info!("detection API listening on http://{addr}");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
        .context("detection API server failed")
}

async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn acquire_camera(
    State(service): State<Arc<DetectionService>>,
) -> Result<Json<Value>, ApiError> {
    let result = tokio::task::spawn_blocking(move || service.acquire())
        .await
        .map_err(|e| {
            error!("acquire task failed: {e}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        })?;

    match result {
        Ok(acquired) => {
            info!(?acquired, "camera ready");
            Ok(Json(json!({ "status": "ready" })))
        }
        Err(e) => {
            warn!("camera acquire failed: {e}");
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

async fn release_camera(
    State(service): State<Arc<DetectionService>>,
) -> Result<Json<ReleaseOutcome>, ApiError> {
    tokio::task::spawn_blocking(move || service.release())
        .await
        .map(|status| Json(ReleaseOutcome::from(status)))
        .map_err(|e| {
            error!("release task failed: {e}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        })
}

async fn detect_webcam(
    State(service): State<Arc<DetectionService>>,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<LoopSummary>, ApiError> {
    let Json(request) = body.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;

    let result = tokio::task::spawn_blocking(move || service.scan(&request))
        .await
        .map_err(|e| {
            error!("scan task failed: {e}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        })?;

    result.map(Json).map_err(|e| {
        let status = status_for(&e);
        warn!(%status, "scan rejected: {e}");
        api_error(status, e.to_string())
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
