//! Application layer use cases for the detection service.
//!
//! # What use cases does the detection service have?
//!
//! - **`device_session`** – Exclusive, lazily opened access to the one
//!   capture device, with an explicit lease for whoever drives it.
//!
//! - **`detection_loop`** – Streams frames through a `Detector` under stop
//!   conditions (deadline, frame cap, first match, stride sampling) and
//!   produces a `LoopSummary`.
//!
//! - **`enrollment`** – Loads the known identities of a persons directory
//!   through a `ReferenceLoader` and the detector's reference encoder.
//!
//! - **`detection_service`** – The facade the HTTP API calls: enroll, lease,
//!   acquire, run.

pub mod detection_loop;
pub mod detection_service;
pub mod device_session;
pub mod enrollment;
