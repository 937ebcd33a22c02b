//! Enrollment: turns a persons directory into a [`KnownIdentitySet`].
//!
//! Each reference image is one identity, labelled by its file stem.  Images
//! in which the detector finds no face are skipped with a warning rather
//! than failing the whole enrollment.

use std::path::{Path, PathBuf};

use faceauth_core::KnownIdentitySet;
use thiserror::Error;
use tracing::{info, warn};

use super::detection_loop::{Detector, DetectorError};

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("persons directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode reference {path}: {source}")]
    Detector {
        path: PathBuf,
        #[source]
        source: DetectorError,
    },
}

/// One reference image as read from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceImage {
    pub label: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Reads the reference images of a persons directory.
pub trait ReferenceLoader: Send + Sync {
    /// Returns the images in a stable order.
    fn load(&self, dir: &Path) -> Result<Vec<ReferenceImage>, EnrollmentError>;
}

/// Encodes every reference image under `dir`.
///
/// An empty result is not an error: every face then classifies as unknown.
pub fn enroll(
    loader: &dyn ReferenceLoader,
    detector: &dyn Detector,
    dir: &Path,
) -> Result<KnownIdentitySet, EnrollmentError> {
    let mut known = KnownIdentitySet::new();
    for image in loader.load(dir)? {
        let encoding = detector
            .encode_reference(&image.bytes)
            .map_err(|source| EnrollmentError::Detector {
                path: image.path.clone(),
                source,
            })?;
        match encoding {
            Some(encoding) => known.push(image.label, encoding),
            None => warn!("no face in reference {}; skipped", image.path.display()),
        }
    }

    if known.is_empty() {
        warn!("no identities enrolled from {}", dir.display());
    } else {
        info!("enrolled {} identities from {}", known.len(), dir.display());
    }
    Ok(known)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::detector::mock::ScriptedDetector;

    struct FixedLoader(Vec<ReferenceImage>);

    impl ReferenceLoader for FixedLoader {
        fn load(&self, dir: &Path) -> Result<Vec<ReferenceImage>, EnrollmentError> {
            if dir == Path::new("missing") {
                return Err(EnrollmentError::MissingDirectory(dir.to_path_buf()));
            }
            Ok(self.0.clone())
        }
    }

    fn image(label: &str, bytes: &[u8]) -> ReferenceImage {
        ReferenceImage {
            label: label.to_string(),
            path: PathBuf::from(format!("{label}.jpg")),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_enroll_keeps_loader_order() {
        // Arrange
        let loader = FixedLoader(vec![image("bob", b"b"), image("alice", b"a")]);

        // Act
        let known = enroll(&loader, &ScriptedDetector::new(), Path::new("persons")).unwrap();

        // Assert
        assert_eq!(known.labels(), vec!["bob", "alice"]);
    }

    #[test]
    fn test_images_without_a_face_are_skipped() {
        let loader = FixedLoader(vec![image("alice", b"a"), image("blank", b"")]);

        let known = enroll(&loader, &ScriptedDetector::new(), Path::new("persons")).unwrap();

        assert_eq!(known.labels(), vec!["alice"]);
    }

    #[test]
    fn test_empty_directory_enrolls_nobody() {
        let known = enroll(&FixedLoader(vec![]), &ScriptedDetector::new(), Path::new("persons")).unwrap();
        assert!(known.is_empty());
    }

    #[test]
    fn test_missing_directory_propagates() {
        let result = enroll(&FixedLoader(vec![]), &ScriptedDetector::new(), Path::new("missing"));
        assert!(matches!(result, Err(EnrollmentError::MissingDirectory(_))));
    }
}
