//! Scripted detector for tests.
//!
//! Call `n` (1-based) of [`ScriptedDetector::detect`] reports the faces
//! scripted for it; unscripted calls report no faces.  Every frame that
//! reached the detector is recorded so tests can check which frames the
//! stride let through.

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};
use std::time::Duration;

use faceauth_core::{
    BoundingBox, DetectionResult, FaceEncoding, FaceObservation, KnownIdentitySet, UNKNOWN_LABEL,
};

use crate::application::detection_loop::{Detector, DetectorError};
use crate::domain::Frame;

/// Distance reported to every identity a scripted face is not.
const MISMATCH_DISTANCE: f64 = 1.0;

/// One face in a scripted frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedFace {
    pub label: String,
    pub distance: f64,
}

impl ScriptedFace {
    /// A face at `distance` from the identity `label`.
    pub fn known(label: &str, distance: f64) -> Self {
        Self {
            label: label.to_string(),
            distance,
        }
    }

    /// A face far from every identity.
    pub fn unknown() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            distance: MISMATCH_DISTANCE,
        }
    }

    fn observe(&self, known: &KnownIdentitySet) -> FaceObservation {
        FaceObservation {
            bounding_box: BoundingBox {
                left: 10,
                top: 10,
                right: 110,
                bottom: 110,
            },
            distances: known
                .iter()
                .map(|id| {
                    if id.label == self.label {
                        self.distance
                    } else {
                        MISMATCH_DISTANCE
                    }
                })
                .collect(),
        }
    }
}

#[derive(Default)]
pub struct ScriptedDetector {
    script: HashMap<usize, Vec<ScriptedFace>>,
    fail_on_call: Option<usize>,
    delay: Duration,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedDetector {
    /// A detector that never sees a face.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `i + 1` reports `script[i]`.
    pub fn from_script(script: Vec<Vec<ScriptedFace>>) -> Self {
        Self {
            script: script
                .into_iter()
                .enumerate()
                .map(|(i, faces)| (i + 1, faces))
                .collect(),
            ..Self::default()
        }
    }

    /// Call `call` (1-based) reports `faces`.
    pub fn on_call(mut self, call: usize, faces: Vec<ScriptedFace>) -> Self {
        self.script.insert(call, faces);
        self
    }

    /// Call `call` (1-based) fails.
    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Sleep this long inside every call, like a real model would.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Pixels of every frame passed to `detect`, in call order.
    pub fn seen_frames(&self) -> Vec<Vec<u8>> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Detector for ScriptedDetector {
    fn detect(
        &self,
        frame: &Frame,
        known: &KnownIdentitySet,
    ) -> Result<Vec<FaceObservation>, DetectorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(frame.pixels.clone());
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail_on_call == Some(call) {
            return Err(DetectorError::Failed(format!("scripted failure on call {call}")));
        }
        Ok(self
            .script
            .get(&call)
            .map(|faces| faces.iter().map(|f| f.observe(known)).collect())
            .unwrap_or_default())
    }

    /// Any non-empty image holds one face; its encoding is its length.
    fn encode_reference(&self, image: &[u8]) -> Result<Option<FaceEncoding>, DetectorError> {
        Ok((!image.is_empty()).then(|| FaceEncoding(vec![image.len() as f32])))
    }

    fn annotate(&self, frame: &Frame, detections: &[DetectionResult]) -> Option<Vec<u8>> {
        let labels: Vec<&str> = detections.iter().map(|d| d.label.as_str()).collect();
        let mut out = format!("annotated:{}:", labels.join(",")).into_bytes();
        out.extend_from_slice(&frame.pixels);
        Some(out)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn set(labels: &[&str]) -> KnownIdentitySet {
        let mut set = KnownIdentitySet::new();
        for label in labels {
            set.push(*label, FaceEncoding(vec![0.0]));
        }
        set
    }

    #[test]
    fn test_scripted_call_reports_distances_in_identity_order() {
        // Arrange
        let detector = ScriptedDetector::new().on_call(2, vec![ScriptedFace::known("bob", 0.25)]);
        let known = set(&["alice", "bob"]);
        let frame = Frame::from_bytes(b"x".to_vec());

        // Act
        let first = detector.detect(&frame, &known).unwrap();
        let second = detector.detect(&frame, &known).unwrap();

        // Assert
        assert!(first.is_empty());
        assert_eq!(second[0].distances, vec![MISMATCH_DISTANCE, 0.25]);
        assert_eq!(detector.calls(), 2);
    }

    #[test]
    fn test_failing_call_returns_error() {
        let detector = ScriptedDetector::new().failing_on_call(1);
        let frame = Frame::from_bytes(b"x".to_vec());

        assert!(detector.detect(&frame, &set(&[])).is_err());
    }

    #[test]
    fn test_empty_reference_image_has_no_face() {
        let detector = ScriptedDetector::new();
        assert!(detector.encode_reference(b"").unwrap().is_none());
        assert!(detector.encode_reference(b"face").unwrap().is_some());
    }
}
