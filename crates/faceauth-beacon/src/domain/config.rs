//! Beacon configuration.
//!
//! [`BeaconConfig`] is a plain struct: the binary fills it from CLI arguments
//! and environment variables, tests build it directly.

use std::net::Ipv4Addr;
use std::time::Duration;

use faceauth_core::protocol::discovery::{
    DEFAULT_BROKER_PORT, DEFAULT_DISCOVERY_PORT, DEFAULT_SERVICE_NAME,
};

/// Address used for the outbound-interface lookup.  Nothing is ever sent to it.
pub const DEFAULT_ROUTE_TARGET: &str = "1.1.1.1:80";

/// All runtime settings of the discovery beacon.
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    /// Name answered to in `WHO_IS` queries and carried in advertisements.
    pub service_name: String,
    /// UDP port the beacon binds, and the destination port of its broadcasts.
    pub discovery_port: u16,
    /// Port advertised to clients (the broker's port, not the beacon's).
    pub advertised_port: u16,
    /// Explicit address to advertise instead of the auto-detected one.
    pub address_override: Option<Ipv4Addr>,
    /// Destination of the periodic advertisement.
    pub broadcast_addr: Ipv4Addr,
    /// Time between two periodic advertisements.
    pub broadcast_interval: Duration,
    /// Longest a single receive may block before the loop checks the clock.
    pub poll_timeout: Duration,
}

impl Default for BeaconConfig {
    /// | Field              | Default             |
    /// |--------------------|---------------------|
    /// | service_name       | `face-broker`       |
    /// | discovery_port     | `18830`             |
    /// | advertised_port    | `1883`              |
    /// | address_override   | none                |
    /// | broadcast_addr     | `255.255.255.255`   |
    /// | broadcast_interval | 2 seconds           |
    /// | poll_timeout       | 200 milliseconds    |
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            discovery_port: DEFAULT_DISCOVERY_PORT,
            advertised_port: DEFAULT_BROKER_PORT,
            address_override: None,
            broadcast_addr: Ipv4Addr::BROADCAST,
            broadcast_interval: Duration::from_secs(2),
            poll_timeout: Duration::from_millis(200),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
