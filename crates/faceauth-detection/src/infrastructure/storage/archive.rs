//! Filesystem [`FrameArchive`]: writes `frame_NNNNNN.jpg` files.

use std::path::{Path, PathBuf};

use crate::application::detection_loop::FrameArchive;

#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryArchive;

impl DirectoryArchive {
    pub fn new() -> Self {
        Self
    }

    /// Name of the file holding frame `frame_index`.
    pub fn file_name(frame_index: u64) -> String {
        format!("frame_{frame_index:06}.jpg")
    }
}

impl FrameArchive for DirectoryArchive {
    /// Creates `dir` if needed.  An existing file for the same index is
    /// overwritten.
    fn store(&self, dir: &Path, frame_index: u64, bytes: &[u8]) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(frame_index));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
