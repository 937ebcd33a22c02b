//! Protocol module: JSON payloads exchanged over UDP, the broker, and HTTP.
//!
//! Every payload is a flat JSON object.  Decoding is strict (serde), but the
//! callers that sit on untrusted transports (the beacon, the bridge's
//! subscription) treat a [`ProtocolError`] as "ignore this datagram/message"
//! rather than as a fatal condition.

pub mod auth;
pub mod detection;
pub mod discovery;

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

pub use auth::*;
pub use detection::{ErrorBody, ReleaseOutcome, ReleaseStatus, ScanRequest};
pub use discovery::*;

/// Errors that can occur while decoding a wire payload.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The bytes were not valid JSON for the expected payload.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload parsed but a field value is not acceptable.
    #[error("invalid field value: {0}")]
    InvalidField(String),
}

/// Returns the current time as floating-point seconds since the Unix epoch.
///
/// This is the `timestamp` representation used by every broker payload.
pub fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
