//! # faceauth-core
//!
//! Shared library for LAN face authentication containing the JSON wire
//! protocol and the detection domain types.
//!
//! This crate is used by the beacon, the detection service, and the bridge.
//! It has no dependencies on sockets, brokers, HTTP, or capture hardware.
//!
//! # Architecture overview
//!
//! A client on an unconfigured LAN locates the message broker through a UDP
//! discovery beacon, then publishes an authentication request.  The bridge
//! turns that request into one bounded detection run against the shared
//! camera and publishes the result.
//!
//! - **`protocol`** – What travels on the wire: discovery datagrams, broker
//!   payloads (request, status, response), and the detection-service call
//!   boundary.
//!
//! - **`domain`** – Pure detection concepts: identities, per-face matches,
//!   stop reasons, and the loop summary the bridge turns into a verdict.

pub mod domain;
pub mod protocol;

pub use domain::detection::{
    BoundingBox, DetectionResult, FaceEncoding, FaceObservation, KnownIdentity, KnownIdentitySet,
    LabelCounts, LoopSummary, StopReason, TimelineEntry, UNKNOWN_LABEL,
};
pub use protocol::auth::{AuthRequest, AuthResponse, AuthStatus, StatusUpdate};
pub use protocol::detection::{ReleaseOutcome, ReleaseStatus, ScanRequest};
pub use protocol::discovery::{DiscoveryAdvertisement, DiscoveryQuery};
pub use protocol::ProtocolError;
