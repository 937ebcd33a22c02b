//! DetectionService: one facade over the session, the detector, enrollment
//! and the archive.
//!
//! Every method here blocks; the HTTP layer calls them from the blocking
//! pool.
//!
//! A scan runs these steps in order and stops at the first failure:
//!
//! 1. validate the request
//! 2. enroll the persons directory (fresh for every scan)
//! 3. take the device lease (`Busy` if another scan holds it)
//! 4. acquire the device (`DeviceUnavailable` if it cannot be opened)
//! 5. run the [`DetectionLoop`]
//!
//! The device is left open afterwards.  Only [`DetectionService::release`]
//! closes it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use faceauth_core::{LoopSummary, ProtocolError, ReleaseStatus, ScanRequest};
use thiserror::Error;
use tracing::{info, instrument};

use super::detection_loop::{DetectionLoop, Detector, DetectorError, FrameArchive, LoopParams};
use super::device_session::{Acquired, DeviceError, DeviceSession};
use super::enrollment::{enroll, EnrollmentError, ReferenceLoader};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid scan request: {0}")]
    InvalidRequest(#[from] ProtocolError),

    #[error("Failed loading persons-dir: {0}")]
    Enrollment(#[from] EnrollmentError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Detector(#[from] DetectorError),
}

pub struct DetectionService {
    session: Arc<DeviceSession>,
    detector: Arc<dyn Detector>,
    references: Arc<dyn ReferenceLoader>,
    archive: Arc<dyn FrameArchive>,
    default_persons_dir: PathBuf,
}

impl DetectionService {
    pub fn new(
        session: Arc<DeviceSession>,
        detector: Arc<dyn Detector>,
        references: Arc<dyn ReferenceLoader>,
        archive: Arc<dyn FrameArchive>,
    ) -> Self {
        Self {
            session,
            detector,
            references,
            archive,
            default_persons_dir: PathBuf::from("persons"),
        }
    }

    /// Directory enrolled when a request leaves `persons_dir` blank.
    pub fn with_default_persons_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_persons_dir = dir.into();
        self
    }

    pub fn session(&self) -> &Arc<DeviceSession> {
        &self.session
    }

    /// Opens the device ahead of a scan.
    pub fn acquire(&self) -> Result<Acquired, DeviceError> {
        self.session.acquire()
    }

    pub fn release(&self) -> ReleaseStatus {
        self.session.release()
    }

    /// Runs one detection scan.
    #[instrument(skip_all, fields(persons_dir = %request.persons_dir))]
    pub fn scan(&self, request: &ScanRequest) -> Result<LoopSummary, ScanError> {
        request.validate()?;

        let persons_dir = if request.persons_dir.trim().is_empty() {
            self.default_persons_dir.clone()
        } else {
            PathBuf::from(&request.persons_dir)
        };
        let known = enroll(self.references.as_ref(), self.detector.as_ref(), &persons_dir)?;

        let mut lease = self.session.try_lease()?;
        self.session.acquire()?;

        let params = LoopParams::from(request);
        info!(
            identities = known.len(),
            stride = params.frame_stride,
            max_frames = ?params.max_frames,
            stop_on_first = params.stop_on_first,
            "scan started"
        );
        let summary = DetectionLoop::new(self.detector.as_ref(), &known, &params)
            .with_archive(self.archive.as_ref())
            .run(&mut lease)?;
        Ok(summary)
    }

    pub fn default_persons_dir(&self) -> &Path {
        &self.default_persons_dir
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
