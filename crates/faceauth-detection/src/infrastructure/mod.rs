//! Infrastructure layer for the detection service.
//!
//! Contains the adapters behind the application traits and the HTTP surface.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `faceauth_core`; the domain layer never imports it.
//!
//! # Sub-modules
//!
//! - **`camera`** – `DeviceOpener` implementations: a directory-replay
//!   device for hardware-free deployments and a counting mock for tests.
//!
//! - **`detector`** – `Detector` implementations.
//!
//! - **`storage`** – Persons-directory reference loading and the annotated
//!   frame archive.
//!
//! - **`http_api`** – The axum router the bridge calls.

pub mod camera;
pub mod detector;
pub mod http_api;
pub mod storage;
