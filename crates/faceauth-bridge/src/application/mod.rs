//! Application layer for the bridge.
//!
//! The application layer knows *what* a transaction does; the infrastructure
//! layer supplies the broker and the detection service behind two traits:
//!
//! - `DetectionBoundary` – prepare / detect / release calls against the
//!   detection service.
//! - `AuthPublisher` – the status and response topics.

pub mod auth_service;

pub use auth_service::{
    AuthBridge, AuthPublisher, BoundaryError, BridgeError, BridgeTimeouts, DetectionBoundary,
    PublishError,
};
