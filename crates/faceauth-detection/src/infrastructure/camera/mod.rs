//! Capture device implementations.
//!
//! # Sub-modules
//!
//! - **`replay`** – Replays image files from a directory as if they came
//!   from a camera, so the service runs without camera hardware.
//!
//! - **`mock`** – Synthetic frames with lifecycle counters, for tests.

pub mod mock;
pub mod replay;

pub use replay::ReplayDeviceOpener;
