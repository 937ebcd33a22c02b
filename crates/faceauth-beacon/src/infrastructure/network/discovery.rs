//! UDP discovery beacon.
//!
//! The beacon binds one UDP socket on the discovery port (default 18830) and
//! runs a single loop on a dedicated thread that does two jobs:
//!
//! 1. Every broadcast interval (default 2 s) it resolves this host's address
//!    and broadcasts a [`DiscoveryAdvertisement`] to the broadcast address.
//! 2. Between ticks it waits for datagrams.  A `WHO_IS` naming this service
//!    gets a unicast advertisement back to its sender; anything else is
//!    dropped.
//!
//! # Read timeout
//!
//! The socket has a short read timeout (default 200 ms).  `recv_from` blocks
//! for at most that long, so the loop regains control often enough both to
//! keep the broadcast schedule and to notice that the `running` flag was
//! cleared.  A lone thread multiplexing both jobs needs no locking: the only
//! shared state is the read-only service metadata.
//!
//! [`DiscoveryAdvertisement`]: faceauth_core::DiscoveryAdvertisement

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use faceauth_core::protocol::discovery::MAX_DATAGRAM_LEN;
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::advertise::{AddressResolver, Advertiser};
use crate::domain::BeaconConfig;

/// Error type for discovery operations, on both the beacon and client side.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The UDP socket could not be created, configured or bound.
    #[error("failed to bind discovery socket on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The beacon thread could not be started.
    #[error("failed to spawn beacon thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// A send or receive failed outside the normal timeout path.
    #[error("discovery I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No matching advertisement arrived within the wait window.
    #[error("no '{service_name}' advertisement received within {waited:?}")]
    Unreachable {
        service_name: String,
        waited: Duration,
    },
}

/// A running beacon.
pub struct BeaconHandle {
    local_addr: SocketAddr,
    thread: JoinHandle<()>,
}

impl BeaconHandle {
    /// The address the discovery socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the beacon thread to exit.  Clear the `running` flag first.
    pub fn join(self) {
        if self.thread.join().is_err() {
            warn!("beacon thread panicked");
        }
    }
}

/// Binds a UDP socket on `0.0.0.0:port` with address reuse and broadcast
/// enabled, and with `poll_timeout` as its read timeout.
///
/// # Errors
///
/// Returns [`DiscoveryError::BindFailed`] if any step fails.
pub fn bind_discovery_socket(port: u16, poll_timeout: Duration) -> Result<UdpSocket, DiscoveryError> {
    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    let fail = |source| DiscoveryError::BindFailed { addr, source };

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(fail)?;
    socket.set_reuse_address(true).map_err(fail)?;
    socket.set_broadcast(true).map_err(fail)?;
    socket.bind(&addr.into()).map_err(fail)?;
    socket.set_read_timeout(Some(poll_timeout)).map_err(fail)?;
    Ok(socket.into())
}

/// Binds the discovery socket and spawns the beacon thread.
///
/// Periodic advertisements are sent to `config.broadcast_addr` on the port the
/// socket actually bound (so a `discovery_port` of 0 picks a free port and
/// broadcasts to it, which is how the tests run the beacon on loopback).
///
/// # Errors
///
/// Returns [`DiscoveryError::BindFailed`] if the socket cannot be bound and
/// [`DiscoveryError::Spawn`] if the thread cannot be started.
pub fn start_beacon<R>(
    config: &BeaconConfig,
    resolver: R,
    running: Arc<AtomicBool>,
) -> Result<BeaconHandle, DiscoveryError>
where
    R: AddressResolver + 'static,
{
    let socket = bind_discovery_socket(config.discovery_port, config.poll_timeout)?;
    let local_addr = socket.local_addr()?;
    let broadcast_target = SocketAddr::V4(SocketAddrV4::new(config.broadcast_addr, local_addr.port()));
    let advertiser = Advertiser::new(config, resolver);
    let poll_timeout = config.poll_timeout;

    let thread = std::thread::Builder::new()
        .name("faceauth-beacon".to_string())
        .spawn(move || beacon_loop(socket, advertiser, broadcast_target, poll_timeout, running))
        .map_err(DiscoveryError::Spawn)?;

    info!(
        "beacon '{}' listening on UDP {local_addr}, broadcasting to {broadcast_target}",
        config.service_name
    );
    Ok(BeaconHandle { local_addr, thread })
}

/// The loop executed on the beacon thread.
fn beacon_loop<R: AddressResolver>(
    socket: UdpSocket,
    mut advertiser: Advertiser<R>,
    broadcast_target: SocketAddr,
    poll_timeout: Duration,
    running: Arc<AtomicBool>,
) {
    let mut buf = [0u8; MAX_DATAGRAM_LEN];

    while running.load(Ordering::Relaxed) {
        let now = Instant::now();
        if advertiser.broadcast_due(now) {
            advertiser.mark_broadcast(now);
            if let Some(ad) = advertiser.advertisement() {
                match socket.send_to(&ad.to_datagram(), broadcast_target) {
                    Ok(_) => debug!("advertised {}:{} to {broadcast_target}", ad.ip_address, ad.port),
                    Err(e) => warn!("broadcast to {broadcast_target} failed: {e}"),
                }
            }
        }

        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(pair) => pair,
            Err(e) if is_timeout_error(&e) => continue,
            Err(e) => {
                warn!("discovery recv error: {e}");
                std::thread::sleep(poll_timeout);
                continue;
            }
        };

        if let Some(reply) = advertiser.reply_to(&buf[..len]) {
            match socket.send_to(&reply.to_datagram(), src) {
                Ok(_) => info!("answered WHO_IS from {src} with {}:{}", reply.ip_address, reply.port),
                Err(e) => warn!("failed to reply to {src}: {e}"),
            }
        }
    }

    info!("beacon '{}' stopped", advertiser.service_name());
}

/// Returns `true` for OS timeout / would-block errors that should be retried.
pub(crate) fn is_timeout_error(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct Loopback;

    impl AddressResolver for Loopback {
        fn resolve(&self) -> Option<Ipv4Addr> {
            Some(Ipv4Addr::LOCALHOST)
        }
    }

    #[test]
    fn test_is_timeout_error_recognises_timed_out() {
        // Arrange
        let e = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");

        // Act / Assert
        assert!(is_timeout_error(&e));
    }

    #[test]
    fn test_is_timeout_error_recognises_would_block() {
        let e = std::io::Error::new(std::io::ErrorKind::WouldBlock, "would block");
        assert!(is_timeout_error(&e));
    }

    #[test]
    fn test_is_timeout_error_returns_false_for_other_errors() {
        let e = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(!is_timeout_error(&e));
    }

    #[test]
    fn test_bind_discovery_socket_applies_read_timeout() {
        let socket = bind_discovery_socket(0, Duration::from_millis(150)).expect("bind");
        assert_eq!(socket.read_timeout().unwrap(), Some(Duration::from_millis(150)));
        assert!(socket.broadcast().unwrap());
    }

    #[test]
    fn test_start_beacon_on_free_port_and_stop() {
        // Arrange
        let config = BeaconConfig {
            discovery_port: 0,
            broadcast_addr: Ipv4Addr::LOCALHOST,
            ..BeaconConfig::default()
        };
        let running = Arc::new(AtomicBool::new(true));

        // Act
        let handle = start_beacon(&config, Loopback, Arc::clone(&running)).expect("beacon starts");
        running.store(false, Ordering::Relaxed);

        // Assert: the loop notices the flag within one poll window
        assert_ne!(handle.local_addr().port(), 0);
        handle.join();
    }
}
