//! Domain layer for the bridge.
//!
//! Pure types with no I/O: configuration, the redelivery filter, and the
//! mapping from a transaction outcome to what gets published.

pub mod config;
pub mod dedup;
pub mod verdict;

pub use config::{BridgeConfig, ConfigError, ScanSettings};
pub use dedup::RecentRequests;
pub use verdict::Verdict;
