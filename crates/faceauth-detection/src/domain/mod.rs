//! Domain types for the detection service.

pub mod config;
pub mod frame;

pub use config::DetectionServiceConfig;
pub use frame::Frame;
