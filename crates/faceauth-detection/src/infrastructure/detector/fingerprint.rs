//! Content-fingerprint detector.
//!
//! Treats every non-empty frame as a single face covering the whole frame
//! and encodes it as the 64 bits of an FNV-1a hash, one `0.0`/`1.0` per
//! dimension.  Identical bytes are at distance zero; different bytes are
//! several units apart, far outside any realistic tolerance.
//!
//! This lets the whole pipeline run without a face model: enroll a file
//! from the replay directory under a person's name and that frame is
//! recognised as them.

use faceauth_core::{BoundingBox, FaceEncoding, FaceObservation, KnownIdentitySet};

use crate::application::detection_loop::{Detector, DetectorError};
use crate::domain::Frame;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintDetector;

impl FingerprintDetector {
    pub fn new() -> Self {
        Self
    }

    fn encode(bytes: &[u8]) -> FaceEncoding {
        let hash = bytes
            .iter()
            .fold(FNV_OFFSET, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME));
        FaceEncoding((0..64).map(|bit| ((hash >> bit) & 1) as f32).collect())
    }
}

impl Detector for FingerprintDetector {
    fn detect(
        &self,
        frame: &Frame,
        known: &KnownIdentitySet,
    ) -> Result<Vec<FaceObservation>, DetectorError> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        let whole_frame = BoundingBox {
            left: 0,
            top: 0,
            right: i32::try_from(frame.width).unwrap_or(i32::MAX),
            bottom: i32::try_from(frame.height).unwrap_or(i32::MAX),
        };
        let encoding = Self::encode(&frame.pixels);
        Ok(vec![FaceObservation::from_encoding(whole_frame, &encoding, known)])
    }

    fn encode_reference(&self, image: &[u8]) -> Result<Option<FaceEncoding>, DetectorError> {
        Ok((!image.is_empty()).then(|| Self::encode(image)))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
