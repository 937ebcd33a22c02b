//! faceauth-bridge library crate.
//!
//! Subscribes to face-authentication requests on the broker, runs one
//! bounded camera transaction per request against the detection service,
//! and publishes progress and the final verdict.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Broker (face/auth/request)
//!         ↓
//! [faceauth-bridge]
//!   ├── domain/              Config, scan settings, dedup window, verdicts
//!   ├── application/         AuthBridge transaction; DetectionBoundary and
//!   │                        AuthPublisher seams
//!   └── infrastructure/
//!         ├── detection_client/  HTTP calls to faceauth-detection (reqwest)
//!         └── mqtt_bus/          Broker event loop and publisher (rumqttc)
//!         ↓
//! Broker (face/auth/status, face/auth/response)
//! ```
//!
//! # Layer rules
//!
//! - `domain` does no I/O.
//! - `application` depends on `domain` and `faceauth-core` only; the broker
//!   and the detection service are reached through traits.
//! - `infrastructure` implements those traits.

/// Domain layer: configuration and verdict types (no I/O).
pub mod domain;

/// Application layer: the authentication transaction.
pub mod application;

/// Infrastructure layer: broker and detection-service adapters.
pub mod infrastructure;
