//! Mock capture device for tests and hardware-free runs.
//!
//! [`MockDeviceOpener`] hands out [`MockCaptureDevice`]s that produce a fixed
//! number of synthetic frames and then stall (return `Ok(None)` forever).
//! Opens, closes and reads are counted in a shared [`MockCameraStats`] so
//! tests can assert on device lifecycle after the session took ownership of
//! the opener.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use crate::application::device_session::{CaptureDevice, CaptureError, DeviceOpener};
use crate::domain::Frame;

/// Shared lifecycle counters.
#[derive(Debug, Clone, Default)]
pub struct MockCameraStats {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl MockCameraStats {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Successful frame reads across every device this opener produced.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

/// Opener producing scripted devices.
#[derive(Debug, Clone)]
pub struct MockDeviceOpener {
    frames: usize,
    fail_open: bool,
    unhealthy: bool,
    read_error_after: Option<usize>,
    frame_delay: Duration,
    stats: MockCameraStats,
}

impl MockDeviceOpener {
    /// Devices that yield `frames` frames and then stall.
    pub fn with_frames(frames: usize) -> Self {
        Self {
            frames,
            fail_open: false,
            unhealthy: false,
            read_error_after: None,
            frame_delay: Duration::ZERO,
            stats: MockCameraStats::default(),
        }
    }

    /// Devices that never run out of frames.
    pub fn endless() -> Self {
        Self::with_frames(usize::MAX)
    }

    /// An opener whose `open` always fails.
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::with_frames(0)
        }
    }

    /// Devices report themselves unhealthy as soon as they are open.
    pub fn unhealthy_after_open(mut self) -> Self {
        self.unhealthy = true;
        self
    }

    /// Devices return a read error after `n` good frames.
    pub fn read_error_after(mut self, n: usize) -> Self {
        self.read_error_after = Some(n);
        self
    }

    /// Sleep this long inside every successful read.
    pub fn frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    pub fn stats(&self) -> MockCameraStats {
        self.stats.clone()
    }
}

impl Default for MockDeviceOpener {
    fn default() -> Self {
        Self::endless()
    }
}

impl DeviceOpener for MockDeviceOpener {
    fn open(&self) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        if self.fail_open {
            return Err(CaptureError::Open("mock camera unavailable".into()));
        }
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCaptureDevice {
            remaining: self.frames,
            produced: 0,
            unhealthy: self.unhealthy,
            read_error_after: self.read_error_after,
            frame_delay: self.frame_delay,
            stats: self.stats.clone(),
        }))
    }
}

/// A device yielding synthetic frames (`b"frame-<n>"`).
pub struct MockCaptureDevice {
    remaining: usize,
    produced: usize,
    unhealthy: bool,
    read_error_after: Option<usize>,
    frame_delay: Duration,
    stats: MockCameraStats,
}

impl CaptureDevice for MockCaptureDevice {
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        if self.read_error_after == Some(self.produced) {
            return Err(CaptureError::Read("mock read failure".into()));
        }
        if self.remaining == 0 {
            return Ok(None);
        }
        if !self.frame_delay.is_zero() {
            std::thread::sleep(self.frame_delay);
        }
        self.remaining -= 1;
        self.produced += 1;
        self.stats.reads.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Frame::from_bytes(
            format!("frame-{}", self.produced).into_bytes(),
        )))
    }

    fn is_healthy(&self) -> bool {
        !self.unhealthy
    }
}

impl Drop for MockCaptureDevice {
    fn drop(&mut self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
