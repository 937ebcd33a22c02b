//! DetectionLoop: streams frames through a [`Detector`] until a stop
//! condition fires.
//!
//! # Algorithm
//!
//! ```text
//! loop:
//!   deadline passed?                 -> Timeout
//!   read frame
//!     none for longer than grace     -> CaptureFailure
//!     device error                   -> CaptureFailure
//!   frame_index += 1                    (1-based, counts every captured frame)
//!   frame_index % stride != 0?       -> skip
//!   detect, classify every face, count labels, archive, timeline
//!   stop_on_first and a known face?  -> StopOnFirstMatch
//!   processed == max_frames?         -> MaxFramesReached
//!   deadline passed?                 -> Timeout
//! ```
//!
//! The loop reads through a [`FrameSource`] (in production a
//! [`DeviceLease`]) and never releases the device itself.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use faceauth_core::protocol::epoch_seconds;
use faceauth_core::{
    DetectionResult, FaceEncoding, FaceObservation, KnownIdentitySet, LabelCounts, LoopSummary,
    ScanRequest, StopReason, TimelineEntry,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::device_session::{CaptureError, DeviceLease};
use crate::domain::Frame;

/// Pause between two reads that returned no frame.
const STALL_POLL: Duration = Duration::from_millis(10);

/// Error type for detector operations.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector failed: {0}")]
    Failed(String),
}

/// The face-matching capability.
///
/// Implementations find faces in a frame and measure each against the known
/// identities; the loop does the classification.
pub trait Detector: Send + Sync {
    /// Finds the faces in `frame`.  Each observation's `distances` must be
    /// indexed like `known`.
    fn detect(
        &self,
        frame: &Frame,
        known: &KnownIdentitySet,
    ) -> Result<Vec<FaceObservation>, DetectorError>;

    /// Computes the reference encoding of an enrollment image, or `None` if
    /// the image contains no face.
    fn encode_reference(&self, image: &[u8]) -> Result<Option<FaceEncoding>, DetectorError>;

    /// Renders `frame` with `detections` drawn on it.  Detectors that cannot
    /// draw return `None` and the raw frame is archived instead.
    fn annotate(&self, _frame: &Frame, _detections: &[DetectionResult]) -> Option<Vec<u8>> {
        None
    }
}

/// Where the loop gets its frames from.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError>;
}

impl FrameSource for DeviceLease {
    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        self.read_frame()
    }
}

/// Persists annotated frames.
pub trait FrameArchive: Send + Sync {
    /// Writes `bytes` as frame `frame_index` under `dir` and returns the path.
    fn store(&self, dir: &Path, frame_index: u64, bytes: &[u8]) -> std::io::Result<PathBuf>;
}

/// Sampling parameters and stop conditions of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopParams {
    pub tolerance: f64,
    pub frame_stride: u32,
    /// `None` disables the deadline.
    pub max_duration: Option<Duration>,
    pub max_frames: Option<u32>,
    pub stop_on_first: bool,
    /// Longest tolerated gap between two captured frames.
    pub stall_grace: Duration,
    pub annotated_dir: Option<PathBuf>,
    pub save_all_frames: bool,
    pub include_timeline: bool,
}

impl Default for LoopParams {
    fn default() -> Self {
        Self {
            tolerance: 0.6,
            frame_stride: 1,
            max_duration: Some(Duration::from_secs(10)),
            max_frames: None,
            stop_on_first: false,
            stall_grace: Duration::from_secs(1),
            annotated_dir: None,
            save_all_frames: false,
            include_timeline: false,
        }
    }
}

impl From<&ScanRequest> for LoopParams {
    fn from(req: &ScanRequest) -> Self {
        Self {
            tolerance: req.tolerance,
            frame_stride: req.effective_stride(),
            max_duration: Duration::try_from_secs_f64(req.max_seconds)
                .ok()
                .filter(|d| !d.is_zero()),
            max_frames: req.effective_max_frames(),
            stop_on_first: req.stop_on_first,
            stall_grace: Duration::try_from_secs_f64(req.stall_grace_seconds)
                .unwrap_or(Duration::from_secs(1)),
            annotated_dir: req
                .annotated_dir
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),
            save_all_frames: req.save_all_frames,
            include_timeline: req.include_timeline,
        }
    }
}

/// Classifies every observed face against `known`.
pub fn classify(
    observations: &[FaceObservation],
    known: &KnownIdentitySet,
    tolerance: f64,
) -> Vec<DetectionResult> {
    observations
        .iter()
        .map(|obs| {
            let (label, distance) = known.classify(&obs.distances, tolerance);
            DetectionResult {
                label,
                distance,
                bounding_box: obs.bounding_box,
            }
        })
        .collect()
}

/// One configured detection run.
pub struct DetectionLoop<'a> {
    detector: &'a dyn Detector,
    known: &'a KnownIdentitySet,
    params: &'a LoopParams,
    archive: Option<&'a dyn FrameArchive>,
}

impl<'a> DetectionLoop<'a> {
    pub fn new(detector: &'a dyn Detector, known: &'a KnownIdentitySet, params: &'a LoopParams) -> Self {
        Self {
            detector,
            known,
            params,
            archive: None,
        }
    }

    /// Frames are archived only when an archive is set and
    /// `params.annotated_dir` names a directory.
    pub fn with_archive(mut self, archive: &'a dyn FrameArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Runs until a stop condition fires.
    ///
    /// # Errors
    ///
    /// Only a detector failure aborts the run with an error; capture problems
    /// end it normally with [`StopReason::CaptureFailure`].
    pub fn run(&self, source: &mut dyn FrameSource) -> Result<LoopSummary, DetectorError> {
        let params = self.params;
        let started = Instant::now();
        // A deadline past the clock's range is no deadline.
        let deadline = params.max_duration.and_then(|d| started.checked_add(d));
        let past_deadline = || deadline.is_some_and(|d| Instant::now() >= d);
        let stride = u64::from(params.frame_stride.max(1));

        let mut frame_index: u64 = 0;
        let mut processed: u64 = 0;
        let mut names_seen = LabelCounts::new();
        let mut unknown_faces: u64 = 0;
        let mut last_annotated: Option<String> = None;
        let mut timeline = params.include_timeline.then(Vec::new);
        let mut last_frame_at = started;

        let stop_reason = loop {
            if past_deadline() {
                break StopReason::Timeout;
            }

            let frame = match source.next_frame() {
                Ok(Some(frame)) => {
                    last_frame_at = Instant::now();
                    frame
                }
                Ok(None) => {
                    if last_frame_at.elapsed() > params.stall_grace {
                        warn!("no frame for {:?}; giving up", last_frame_at.elapsed());
                        break StopReason::CaptureFailure;
                    }
                    std::thread::sleep(STALL_POLL);
                    continue;
                }
                Err(e) => {
                    warn!("capture failed after {frame_index} frame(s): {e}");
                    break StopReason::CaptureFailure;
                }
            };

            frame_index += 1;
            if frame_index % stride != 0 {
                continue;
            }
            processed += 1;

            let observations = self.detector.detect(&frame, self.known)?;
            let detections = classify(&observations, self.known, params.tolerance);

            let mut frame_has_match = false;
            for detection in &detections {
                if detection.is_known() {
                    names_seen.increment(&detection.label);
                    frame_has_match = true;
                } else {
                    unknown_faces += 1;
                }
            }
            debug!(frame_index, faces = detections.len(), frame_has_match, "frame processed");

            if let Some(path) = self.archive_frame(frame_index, &frame, &detections) {
                last_annotated = Some(path);
            }
            if let Some(entries) = timeline.as_mut() {
                entries.push(TimelineEntry {
                    ts: epoch_seconds(),
                    frame_index,
                    detections,
                });
            }

            if params.stop_on_first && frame_has_match {
                break StopReason::StopOnFirstMatch;
            }
            if params.max_frames.is_some_and(|cap| processed >= u64::from(cap)) {
                break StopReason::MaxFramesReached;
            }
            if past_deadline() {
                break StopReason::Timeout;
            }
        };

        info!(
            frames_processed = processed,
            captured = frame_index,
            recognised = names_seen.len(),
            ?stop_reason,
            "detection run finished"
        );

        Ok(LoopSummary {
            frames_processed: processed,
            names_seen,
            unknown_frames: unknown_faces,
            stop_reason,
            last_annotated_frame: last_annotated,
            timeline,
        })
    }

    /// Writes the frame if archiving applies to it; returns the written path.
    fn archive_frame(
        &self,
        frame_index: u64,
        frame: &Frame,
        detections: &[DetectionResult],
    ) -> Option<String> {
        let archive = self.archive?;
        let dir = self.params.annotated_dir.as_deref()?;
        if detections.is_empty() && !self.params.save_all_frames {
            return None;
        }

        let bytes: Cow<'_, [u8]> = if detections.is_empty() {
            Cow::Borrowed(frame.pixels.as_slice())
        } else {
            self.detector
                .annotate(frame, detections)
                .map_or(Cow::Borrowed(frame.pixels.as_slice()), Cow::Owned)
        };

        match archive.store(dir, frame_index, &bytes) {
            Ok(path) => Some(path.display().to_string()),
            Err(e) => {
                warn!("failed to archive frame {frame_index} under {}: {e}", dir.display());
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
