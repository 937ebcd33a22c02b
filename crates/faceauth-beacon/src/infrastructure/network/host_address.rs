//! Resolution of the address this host is reachable at.
//!
//! An explicit override always wins.  Otherwise the outbound-interface lookup
//! is used: a UDP socket is "connected" to a public address, which makes the
//! OS pick the source interface without sending a single packet, and the
//! socket's local address is read back.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use tracing::{debug, warn};

use crate::application::advertise::AddressResolver;
use crate::domain::config::DEFAULT_ROUTE_TARGET;

/// [`AddressResolver`] backed by the OS routing table.
#[derive(Debug, Clone)]
pub struct HostAddressResolver {
    override_ip: Option<Ipv4Addr>,
    route_target: SocketAddr,
}

impl HostAddressResolver {
    pub fn new(override_ip: Option<Ipv4Addr>) -> Self {
        Self {
            override_ip,
            route_target: DEFAULT_ROUTE_TARGET
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([1, 1, 1, 1], 80))),
        }
    }

    /// Uses `target` instead of the default public route target.
    pub fn with_route_target(mut self, target: SocketAddr) -> Self {
        self.route_target = target;
        self
    }

    /// Runs the outbound-interface lookup against `target`.
    ///
    /// # Errors
    ///
    /// Fails when the OS has no route to `target` or picks a non-IPv4 or
    /// unspecified source address.
    pub fn outbound_address(target: SocketAddr) -> std::io::Result<Ipv4Addr> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(target)?;
        match socket.local_addr()?.ip() {
            IpAddr::V4(ip) if !ip.is_unspecified() => Ok(ip),
            other => Err(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("route lookup picked unusable source address {other}"),
            )),
        }
    }
}

impl AddressResolver for HostAddressResolver {
    fn resolve(&self) -> Option<Ipv4Addr> {
        if let Some(ip) = self.override_ip {
            return Some(ip);
        }
        match Self::outbound_address(self.route_target) {
            Ok(ip) => {
                debug!("auto-detected host address {ip}");
                Some(ip)
            }
            Err(e) => {
                warn!("host address lookup via {} failed: {e}", self.route_target);
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
