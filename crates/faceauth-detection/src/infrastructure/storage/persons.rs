//! Filesystem [`ReferenceLoader`]: one image file per enrolled person.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::application::enrollment::{EnrollmentError, ReferenceImage, ReferenceLoader};

/// File extensions accepted as reference images (compared case-insensitively).
pub const REFERENCE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "webp"];

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryReferenceLoader;

impl DirectoryReferenceLoader {
    pub fn new() -> Self {
        Self
    }
}

fn is_reference_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            REFERENCE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

impl ReferenceLoader for DirectoryReferenceLoader {
    fn load(&self, dir: &Path) -> Result<Vec<ReferenceImage>, EnrollmentError> {
        if !dir.is_dir() {
            return Err(EnrollmentError::MissingDirectory(dir.to_path_buf()));
        }
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| EnrollmentError::Io { path, source }
        };

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(io_err(dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_reference_image(p))
            .collect();
        paths.sort();

        let mut images = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(label) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                debug!("skipping {} (non UTF-8 name)", path.display());
                continue;
            };
            let bytes = std::fs::read(&path).map_err(io_err(&path))?;
            images.push(ReferenceImage { label, path, bytes });
        }
        Ok(images)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
