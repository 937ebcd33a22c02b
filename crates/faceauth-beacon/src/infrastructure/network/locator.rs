//! Client-side discovery: find a service by broadcasting `WHO_IS`.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::{Duration, Instant};

use faceauth_core::protocol::discovery::{
    DEFAULT_DISCOVERY_PORT, DEFAULT_SERVICE_NAME, MAX_DATAGRAM_LEN,
};
use faceauth_core::{DiscoveryAdvertisement, DiscoveryQuery};
use tracing::{debug, info};

use super::discovery::{is_timeout_error, DiscoveryError};

/// Where and how long to look for a service.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    pub service_name: String,
    pub discovery_port: u16,
    /// Destination of the `WHO_IS` query.
    pub broadcast_addr: Ipv4Addr,
    /// Total time to wait before giving up.
    pub wait: Duration,
    /// The query is re-sent at the start of every slice of this length.
    pub resend_every: Duration,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            discovery_port: DEFAULT_DISCOVERY_PORT,
            broadcast_addr: Ipv4Addr::BROADCAST,
            wait: Duration::from_secs(5),
            resend_every: Duration::from_millis(500),
        }
    }
}

/// Broadcasts `WHO_IS` for `config.service_name` and returns the first
/// matching advertisement.
///
/// # Errors
///
/// Returns [`DiscoveryError::Unreachable`] when nothing matching arrives
/// within `config.wait`, or an I/O variant if the socket cannot be used.
pub fn locate(config: &LocatorConfig) -> Result<DiscoveryAdvertisement, DiscoveryError> {
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_broadcast(true)?;
    let target = SocketAddr::V4(SocketAddrV4::new(config.broadcast_addr, config.discovery_port));
    let query = DiscoveryQuery::who_is(config.service_name.clone()).to_datagram();
    let slice = config.resend_every.max(Duration::from_millis(10));

    let started = Instant::now();
    let deadline = started + config.wait;
    let mut buf = [0u8; MAX_DATAGRAM_LEN];

    while Instant::now() < deadline {
        socket.send_to(&query, target)?;
        debug!("sent WHO_IS for '{}' to {target}", config.service_name);
        let slice_end = (Instant::now() + slice).min(deadline);

        loop {
            let remaining = slice_end.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            socket.set_read_timeout(Some(remaining))?;
            let (len, src) = match socket.recv_from(&mut buf) {
                Ok(pair) => pair,
                Err(e) if is_timeout_error(&e) => break,
                Err(e) => return Err(e.into()),
            };
            match DiscoveryAdvertisement::from_datagram(&buf[..len]) {
                Ok(ad) if ad.service_name == config.service_name => {
                    info!("located '{}' at {}:{} (from {src})", ad.service_name, ad.ip_address, ad.port);
                    return Ok(ad);
                }
                Ok(ad) => debug!("ignoring advertisement for '{}'", ad.service_name),
                Err(e) => debug!("ignoring datagram from {src}: {e}"),
            }
        }
    }

    Err(DiscoveryError::Unreachable {
        service_name: config.service_name.clone(),
        waited: started.elapsed(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locator_targets_deployed_beacon() {
        let cfg = LocatorConfig::default();
        assert_eq!(cfg.service_name, "face-broker");
        assert_eq!(cfg.discovery_port, 18830);
        assert_eq!(cfg.broadcast_addr, Ipv4Addr::BROADCAST);
    }

    #[test]
    fn test_locate_without_beacon_is_unreachable() {
        // Arrange: a loopback port nobody answers on
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = silent.local_addr().unwrap().port();
        let cfg = LocatorConfig {
            discovery_port: port,
            broadcast_addr: Ipv4Addr::LOCALHOST,
            wait: Duration::from_millis(300),
            resend_every: Duration::from_millis(100),
            ..LocatorConfig::default()
        };

        // Act
        let result = locate(&cfg);

        // Assert
        assert!(matches!(result, Err(DiscoveryError::Unreachable { .. })));
    }

    #[test]
    fn test_locate_accepts_advertisement_from_responder() {
        // Arrange: a hand-rolled responder answering every datagram
        let responder = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = responder.local_addr().unwrap().port();
        let thread = std::thread::spawn(move || {
            let mut buf = [0u8; 512];
            let (_, src) = responder.recv_from(&mut buf).unwrap();
            let other = DiscoveryAdvertisement {
                service_name: "printer".to_string(),
                ip_address: "10.0.0.9".to_string(),
                port: 9100,
            };
            responder.send_to(&other.to_datagram(), src).unwrap();
            let ours = DiscoveryAdvertisement {
                service_name: "face-broker".to_string(),
                ip_address: "10.0.0.5".to_string(),
                port: 1883,
            };
            responder.send_to(&ours.to_datagram(), src).unwrap();
        });
        let cfg = LocatorConfig {
            discovery_port: port,
            broadcast_addr: Ipv4Addr::LOCALHOST,
            wait: Duration::from_secs(2),
            ..LocatorConfig::default()
        };

        // Act
        let ad = locate(&cfg).expect("responder answers");

        // Assert: the other service's advertisement was skipped
        assert_eq!(ad.ip_address, "10.0.0.5");
        assert_eq!(ad.port, 1883);
        thread.join().unwrap();
    }
}
