//! Payloads of the detection-service call boundary.
//!
//! The bridge drives the detection service with two calls: a scan, whose body
//! is a [`ScanRequest`] and whose reply is a
//! [`LoopSummary`](crate::domain::detection::LoopSummary), and an idempotent
//! device release whose reply is a [`ReleaseOutcome`].

use serde::{Deserialize, Serialize};

use super::ProtocolError;

fn default_tolerance() -> f64 {
    0.6
}

fn default_max_seconds() -> f64 {
    10.0
}

fn default_frame_stride() -> u32 {
    5
}

fn default_stall_grace_seconds() -> f64 {
    1.0
}

/// Sampling parameters and stop conditions for one detection run.
///
/// Fields left out of the JSON body take the service defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Directory holding one reference image per enrolled identity.
    pub persons_dir: String,

    /// Largest face distance still accepted as a match.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Wall-clock budget for the run.  Zero or negative disables the deadline.
    #[serde(default = "default_max_seconds")]
    pub max_seconds: f64,

    /// Stop after this many frames reached the detector.
    #[serde(default)]
    pub max_frames: Option<u32>,

    /// Only every `frame_stride`-th captured frame is examined.
    #[serde(default = "default_frame_stride")]
    pub frame_stride: u32,

    /// End the run on the first frame containing a recognised identity.
    #[serde(default)]
    pub stop_on_first: bool,

    /// Where annotated frames are written, if anywhere.
    #[serde(default)]
    pub annotated_dir: Option<String>,

    /// Also write frames that contained no faces.
    #[serde(default)]
    pub save_all_frames: bool,

    /// Attach the per-frame timeline to the summary.
    #[serde(default)]
    pub include_timeline: bool,

    /// How long the capture device may go without producing a frame.
    #[serde(default = "default_stall_grace_seconds")]
    pub stall_grace_seconds: f64,
}

impl ScanRequest {
    /// A request against `persons_dir` with every other field at its default.
    pub fn new(persons_dir: impl Into<String>) -> Self {
        Self {
            persons_dir: persons_dir.into(),
            tolerance: default_tolerance(),
            max_seconds: default_max_seconds(),
            max_frames: None,
            frame_stride: default_frame_stride(),
            stop_on_first: false,
            annotated_dir: None,
            save_all_frames: false,
            include_timeline: false,
            stall_grace_seconds: default_stall_grace_seconds(),
        }
    }

    /// The stride actually applied: never less than one.
    pub fn effective_stride(&self) -> u32 {
        self.frame_stride.max(1)
    }

    /// The frame cap actually applied: a cap of zero means "no cap".
    pub fn effective_max_frames(&self) -> Option<u32> {
        self.max_frames.filter(|&n| n > 0)
    }

    /// Rejects parameter values that cannot describe a run.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidField`] when the tolerance, duration or
    /// stall window is not a finite non-negative number.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ProtocolError::InvalidField(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if !self.max_seconds.is_finite() {
            return Err(ProtocolError::InvalidField(
                "max_seconds must be finite".to_string(),
            ));
        }
        if !self.stall_grace_seconds.is_finite() || self.stall_grace_seconds < 0.0 {
            return Err(ProtocolError::InvalidField(format!(
                "stall_grace_seconds must be a non-negative number, got {}",
                self.stall_grace_seconds
            )));
        }
        Ok(())
    }
}

/// What a release call found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStatus {
    /// The device was open and has been closed.
    Released,
    /// There was nothing to close.
    NotOpen,
}

/// Reply body of the release call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseOutcome {
    pub status: ReleaseStatus,
    pub message: String,
}

impl From<ReleaseStatus> for ReleaseOutcome {
    fn from(status: ReleaseStatus) -> Self {
        let message = match status {
            ReleaseStatus::Released => "Camera released successfully",
            ReleaseStatus::NotOpen => "Camera was not open",
        };
        Self {
            status,
            message: message.to_string(),
        }
    }
}

/// Body of every non-2xx reply from the detection service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_request_minimal_body_takes_defaults() {
        // Arrange
        let body = r#"{"persons_dir":"persons"}"#;

        // Act
        let req: ScanRequest = serde_json::from_str(body).unwrap();

        // Assert
        assert_eq!(req, ScanRequest::new("persons"));
        assert_eq!(req.tolerance, 0.6);
        assert_eq!(req.frame_stride, 5);
        assert_eq!(req.stall_grace_seconds, 1.0);
        assert!(!req.stop_on_first);
    }

    #[test]
    fn test_scan_request_missing_persons_dir_is_rejected() {
        assert!(serde_json::from_str::<ScanRequest>(r#"{"tolerance":0.5}"#).is_err());
    }

    #[test]
    fn test_effective_stride_clamps_zero_to_one() {
        let mut req = ScanRequest::new("p");
        req.frame_stride = 0;
        assert_eq!(req.effective_stride(), 1);
    }

    #[test]
    fn test_effective_max_frames_treats_zero_as_unbounded() {
        let mut req = ScanRequest::new("p");
        req.max_frames = Some(0);
        assert_eq!(req.effective_max_frames(), None);
        req.max_frames = Some(12);
        assert_eq!(req.effective_max_frames(), Some(12));
    }

    #[test]
    fn test_validate_rejects_negative_tolerance() {
        let mut req = ScanRequest::new("p");
        req.tolerance = -0.1;
        assert!(matches!(req.validate(), Err(ProtocolError::InvalidField(_))));
    }

    #[test]
    fn test_validate_rejects_nan_stall_window() {
        let mut req = ScanRequest::new("p");
        req.stall_grace_seconds = f64::NAN;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(ScanRequest::new("p").validate().is_ok());
    }

    #[test]
    fn test_release_outcome_wire_shape() {
        let outcome = ReleaseOutcome::from(ReleaseStatus::NotOpen);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "not_open");
        assert_eq!(json["message"], "Camera was not open");
    }
}
