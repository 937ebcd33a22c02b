//! [`Detector`](crate::application::detection_loop::Detector) implementations.
//!
//! - **`fingerprint`** – exact-content matching; the default for
//!   model-free deployments and demos.
//! - **`mock`** – a per-call scripted detector for tests.

pub mod fingerprint;
pub mod mock;

pub use fingerprint::FingerprintDetector;
