//! faceauth-detection library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the detection service do?
//!
//! It owns the one physical camera on the host and answers "who is in front
//! of the camera right now?" for the bridge:
//!
//! 1. Loads the enrolled identities from a persons directory.
//! 2. Takes the exclusive lease on the camera session, opening the device if
//!    it is not already open.
//! 3. Streams frames through the detector until a stop condition fires.
//! 4. Returns a summary of what was seen.  The device stays open for the
//!    next request until someone explicitly releases it.

/// Domain layer: frames and service configuration.
pub mod domain;

/// Application layer: device session, detection loop, enrollment, and the
/// service facade tying them together.
pub mod application;

/// Infrastructure layer: capture devices, detectors, filesystem, and HTTP.
pub mod infrastructure;
