//! HTTP [`DetectionBoundary`] talking to the detection service.

use std::time::Duration;

use async_trait::async_trait;
use faceauth_core::protocol::ErrorBody;
use faceauth_core::{LoopSummary, ReleaseOutcome, ReleaseStatus, ScanRequest};
use reqwest::{Client, Response};
use tracing::{debug, warn};

use crate::application::{BoundaryError, DetectionBoundary};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpDetectionClient {
    client: Client,
    base_url: String,
    release_timeout: Duration,
}

impl HttpDetectionClient {
    /// `base_url` is the service root, e.g. `http://localhost:8000`.
    ///
    /// Scan calls carry no per-request timeout; the bridge bounds the whole
    /// transaction.  Release calls are bounded by `release_timeout`.
    pub fn new(base_url: &str, release_timeout: Duration) -> Result<Self, BoundaryError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BoundaryError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            release_timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport(e: reqwest::Error) -> BoundaryError {
    BoundaryError::Transport(e.to_string())
}

/// Turns a non-2xx reply into [`BoundaryError::Api`], logging the service's
/// error text if it sent one.
async fn check_status(response: Response) -> Result<Response, BoundaryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match response.json::<ErrorBody>().await {
        Ok(body) => warn!("detection service returned {status}: {}", body.error),
        Err(_) => warn!("detection service returned {status}"),
    }
    Err(BoundaryError::Api {
        status: status.as_u16(),
    })
}

#[async_trait]
impl DetectionBoundary for HttpDetectionClient {
    async fn prepare_device(&self) -> Result<(), BoundaryError> {
        let response = self
            .client
            .post(self.url("/camera/acquire"))
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await?;
        debug!("camera prepared");
        Ok(())
    }

    async fn detect(&self, request: &ScanRequest) -> Result<LoopSummary, BoundaryError> {
        let response = self
            .client
            .post(self.url("/detect-webcam"))
            .json(request)
            .send()
            .await
            .map_err(transport)?;
        check_status(response)
            .await?
            .json::<LoopSummary>()
            .await
            .map_err(transport)
    }

    async fn release_device(&self) -> Result<ReleaseStatus, BoundaryError> {
        let response = self
            .client
            .post(self.url("/camera/release"))
            .timeout(self.release_timeout)
            .send()
            .await
            .map_err(transport)?;
        let outcome = check_status(response)
            .await?
            .json::<ReleaseOutcome>()
            .await
            .map_err(transport)?;
        debug!("{}", outcome.message);
        Ok(outcome.status)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
