//! DeviceSession: exclusive, lazily opened access to the one capture device.
//!
//! # Locks
//!
//! Two locks with different jobs:
//!
//! - `lifecycle` serializes [`DeviceSession::acquire`] and
//!   [`DeviceSession::release`], so a device is never opened twice or closed
//!   while being opened.
//! - `handle` guards the open device itself.  Frame reads take only this
//!   lock, so a release issued while a read is in flight waits for that one
//!   read and then closes the device; the next read sees it closed.
//!
//! # Lease
//!
//! Who may *drive* the device is a separate question from whether it is
//! open.  [`DeviceSession::try_lease`] hands out at most one
//! [`DeviceLease`] at a time; a second caller gets [`DeviceError::Busy`].
//! Dropping the lease frees it.  The lease never closes the device: the
//! session stays open for reuse until someone calls `release`.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use faceauth_core::ReleaseStatus;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::Frame;

/// Errors raised by a capture device.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device could not be opened.
    #[error("cannot open capture device: {0}")]
    Open(String),

    /// A read was attempted while no device was open.
    #[error("capture device is not open")]
    NotOpen,

    /// The device failed while reading.
    #[error("capture read failed: {0}")]
    Read(String),
}

/// Errors surfaced by the session to its callers.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device could not be opened.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(#[source] CaptureError),

    /// Another detection run holds the lease.
    #[error("camera is busy with another detection run")]
    Busy,
}

/// An open capture device.  Dropping it closes the device.
pub trait CaptureDevice: Send {
    /// Reads the next frame.
    ///
    /// `Ok(None)` means "no frame right now" (the device is stalling); the
    /// caller decides how long to tolerate that.
    fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError>;

    /// Returns `false` once the device is known to be unusable, so the next
    /// `acquire` reopens it instead of reusing it.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Opens the physical (or replayed, or mocked) device.
pub trait DeviceOpener: Send + Sync {
    fn open(&self) -> Result<Box<dyn CaptureDevice>, CaptureError>;
}

/// What [`DeviceSession::acquire`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquired {
    /// The device was closed (or unhealthy) and has been opened.
    Opened,
    /// A healthy open device already existed and is reused unchanged.
    Reused,
}

type Handle = Option<Box<dyn CaptureDevice>>;

/// The process-wide camera session.  Create one and share it by `Arc`.
pub struct DeviceSession {
    opener: Box<dyn DeviceOpener>,
    lifecycle: Mutex<()>,
    handle: Mutex<Handle>,
    leased: AtomicBool,
}

impl DeviceSession {
    pub fn new(opener: Box<dyn DeviceOpener>) -> Arc<Self> {
        Arc::new(Self {
            opener,
            lifecycle: Mutex::new(()),
            handle: Mutex::new(None),
            leased: AtomicBool::new(false),
        })
    }

    /// Opens the device unless a healthy one is already open.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::DeviceUnavailable`] when the device cannot be
    /// opened.  The session is left closed in that case.
    pub fn acquire(&self) -> Result<Acquired, DeviceError> {
        let _lifecycle = lock(&self.lifecycle);
        let mut handle = lock(&self.handle);

        if let Some(device) = handle.as_ref() {
            if device.is_healthy() {
                debug!("reusing open capture device");
                return Ok(Acquired::Reused);
            }
            warn!("capture device unhealthy; reopening");
            *handle = None;
        }

        let device = self.opener.open().map_err(DeviceError::DeviceUnavailable)?;
        *handle = Some(device);
        info!("capture device opened");
        Ok(Acquired::Opened)
    }

    /// Closes the device if it is open.  Never fails; safe to call repeatedly.
    pub fn release(&self) -> ReleaseStatus {
        let _lifecycle = lock(&self.lifecycle);
        let device = lock(&self.handle).take();
        match device {
            Some(device) => {
                drop(device);
                info!("capture device released");
                ReleaseStatus::Released
            }
            None => {
                debug!("release requested but capture device was not open");
                ReleaseStatus::NotOpen
            }
        }
    }

    pub fn is_open(&self) -> bool {
        lock(&self.handle).is_some()
    }

    pub fn is_leased(&self) -> bool {
        self.leased.load(Ordering::Acquire)
    }

    /// Takes the exclusive right to read frames.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Busy`] while another lease is alive.
    pub fn try_lease(self: &Arc<Self>) -> Result<DeviceLease, DeviceError> {
        self.leased
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DeviceError::Busy)?;
        Ok(DeviceLease {
            session: Arc::clone(self),
        })
    }

    fn read_frame(&self) -> Result<Option<Frame>, CaptureError> {
        match lock(&self.handle).as_mut() {
            Some(device) => device.read_frame(),
            None => Err(CaptureError::NotOpen),
        }
    }
}

/// Exclusive right to read frames from a [`DeviceSession`].
pub struct DeviceLease {
    session: Arc<DeviceSession>,
}

impl DeviceLease {
    /// Reads one frame from the session's device.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NotOpen`] if the device was released (or never
    /// acquired) and whatever the device itself reports otherwise.
    pub fn read_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        self.session.read_frame()
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.session.leased.store(false, Ordering::Release);
    }
}

/// Locks `mutex`, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
