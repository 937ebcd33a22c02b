//! Directory-replay capture device.
//!
//! Every regular file in the frames directory is one frame, served in file
//! name order.  With looping enabled the sequence restarts after the last
//! file; without it the device stalls, which the detection loop turns into
//! a capture failure once the stall grace window passes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::application::device_session::{CaptureDevice, CaptureError, DeviceOpener};
use crate::domain::Frame;

/// Opens a [`ReplayDevice`] over a directory.
#[derive(Debug, Clone)]
pub struct ReplayDeviceOpener {
    dir: PathBuf,
    looping: bool,
    frame_interval: Duration,
}

impl ReplayDeviceOpener {
    pub fn new(dir: impl Into<PathBuf>, looping: bool) -> Self {
        Self {
            dir: dir.into(),
            looping,
            frame_interval: Duration::ZERO,
        }
    }

    /// Paces reads to roughly one frame per `interval`, like a real camera.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }
}

impl DeviceOpener for ReplayDeviceOpener {
    fn open(&self) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        let files = list_frame_files(&self.dir)?;
        if files.is_empty() {
            return Err(CaptureError::Open(format!(
                "no frame files in {}",
                self.dir.display()
            )));
        }
        info!("replaying {} frame(s) from {}", files.len(), self.dir.display());
        Ok(Box::new(ReplayDevice {
            files,
            next: 0,
            looping: self.looping,
            frame_interval: self.frame_interval,
        }))
    }
}

/// Regular files of `dir`, sorted by file name.
fn list_frame_files(dir: &Path) -> Result<Vec<PathBuf>, CaptureError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| CaptureError::Open(format!("{}: {e}", dir.display())))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// A capture device backed by a list of files.
pub struct ReplayDevice {
    files: Vec<PathBuf>,
    next: usize,
    looping: bool,
    frame_interval: Duration,
}

impl CaptureDevice for ReplayDevice {
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if self.next >= self.files.len() {
            if !self.looping {
                return Ok(None);
            }
            debug!("replay wrapped around");
            self.next = 0;
        }
        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }
        let path = &self.files[self.next];
        self.next += 1;
        let bytes = std::fs::read(path)
            .map_err(|e| CaptureError::Read(format!("{}: {e}", path.display())))?;
        Ok(Some(Frame::from_bytes(bytes)))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn frames_dir(files: &[(&str, &[u8])]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("faceauth_replay_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        for (name, bytes) in files {
            std::fs::write(dir.join(name), bytes).unwrap();
        }
        dir
    }

    #[test]
    fn test_replays_files_in_name_order() {
        // Arrange
        let dir = frames_dir(&[("b.jpg", &b"second"[..]), ("a.jpg", &b"first"[..])]);
        let mut device = ReplayDeviceOpener::new(&dir, false).open().unwrap();

        // Act
        let first = device.read_frame().unwrap().unwrap();
        let second = device.read_frame().unwrap().unwrap();
        let end = device.read_frame().unwrap();

        // Assert
        assert_eq!(first.pixels, b"first");
        assert_eq!(second.pixels, b"second");
        assert!(end.is_none(), "non-looping replay stalls at the end");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_looping_replay_wraps_around() {
        let dir = frames_dir(&[("only.jpg", &b"x"[..])]);
        let mut device = ReplayDeviceOpener::new(&dir, true).open().unwrap();

        for _ in 0..3 {
            assert_eq!(device.read_frame().unwrap().unwrap().pixels, b"x");
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_directory_fails_to_open() {
        let dir = std::env::temp_dir().join(format!("faceauth_missing_{}", Uuid::new_v4()));
        assert!(matches!(
            ReplayDeviceOpener::new(dir, true).open(),
            Err(CaptureError::Open(_))
        ));
    }

    #[test]
    fn test_empty_directory_fails_to_open() {
        let dir = frames_dir(&[]);
        assert!(ReplayDeviceOpener::new(&dir, true).open().is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
