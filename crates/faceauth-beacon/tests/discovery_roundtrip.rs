//! Integration tests: a real beacon thread on loopback answering real
//! datagrams.

use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use faceauth_beacon::domain::BeaconConfig;
use faceauth_beacon::infrastructure::network::{
    locate, start_beacon, BeaconHandle, HostAddressResolver, LocatorConfig,
};
use faceauth_core::{DiscoveryAdvertisement, DiscoveryQuery};

/// Starts a beacon on a free loopback port that advertises 127.0.0.1.
fn loopback_beacon(running: &Arc<AtomicBool>) -> BeaconHandle {
    let config = BeaconConfig {
        discovery_port: 0,
        broadcast_addr: Ipv4Addr::LOCALHOST,
        address_override: Some(Ipv4Addr::LOCALHOST),
        ..BeaconConfig::default()
    };
    let resolver = HostAddressResolver::new(config.address_override);
    start_beacon(&config, resolver, Arc::clone(running)).expect("beacon must start")
}

fn beacon_target(handle: &BeaconHandle) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, handle.local_addr().port()))
}

#[test]
fn test_matching_query_gets_unicast_advertisement() {
    // Arrange
    let running = Arc::new(AtomicBool::new(true));
    let beacon = loopback_beacon(&running);
    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client.set_read_timeout(Some(Duration::from_secs(1))).unwrap();

    // Act
    client
        .send_to(&DiscoveryQuery::who_is("face-broker").to_datagram(), beacon_target(&beacon))
        .unwrap();
    let mut buf = [0u8; 512];
    let (len, src) = client.recv_from(&mut buf).expect("reply within the poll window");

    // Assert
    let ad = DiscoveryAdvertisement::from_datagram(&buf[..len]).unwrap();
    assert_eq!(src.port(), beacon.local_addr().port());
    assert_eq!(ad.service_name, "face-broker");
    assert_eq!(ad.ip_address, "127.0.0.1");
    assert_eq!(ad.port, 1883);

    running.store(false, Ordering::Relaxed);
    beacon.join();
}

#[test]
fn test_query_for_other_service_gets_no_reply() {
    // Arrange
    let running = Arc::new(AtomicBool::new(true));
    let beacon = loopback_beacon(&running);
    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client.set_read_timeout(Some(Duration::from_millis(600))).unwrap();

    // Act
    client
        .send_to(&DiscoveryQuery::who_is("not-the-broker").to_datagram(), beacon_target(&beacon))
        .unwrap();
    let mut buf = [0u8; 512];
    let result = client.recv_from(&mut buf);

    // Assert
    assert!(result.is_err(), "no datagram may arrive for a foreign service name");

    running.store(false, Ordering::Relaxed);
    beacon.join();
}

#[test]
fn test_malformed_datagram_does_not_stop_the_beacon() {
    let running = Arc::new(AtomicBool::new(true));
    let beacon = loopback_beacon(&running);
    let client = UdpSocket::bind("127.0.0.1:0").unwrap();
    client.set_read_timeout(Some(Duration::from_secs(1))).unwrap();

    client.send_to(b"{not json", beacon_target(&beacon)).unwrap();
    client
        .send_to(&DiscoveryQuery::who_is("face-broker").to_datagram(), beacon_target(&beacon))
        .unwrap();

    let mut buf = [0u8; 512];
    let (len, _) = client.recv_from(&mut buf).expect("beacon still answers");
    assert!(DiscoveryAdvertisement::from_datagram(&buf[..len]).is_ok());

    running.store(false, Ordering::Relaxed);
    beacon.join();
}

#[test]
fn test_locator_finds_running_beacon() {
    // Arrange
    let running = Arc::new(AtomicBool::new(true));
    let beacon = loopback_beacon(&running);
    let cfg = LocatorConfig {
        discovery_port: beacon.local_addr().port(),
        broadcast_addr: Ipv4Addr::LOCALHOST,
        wait: Duration::from_secs(2),
        ..LocatorConfig::default()
    };

    // Act
    let ad = locate(&cfg).expect("beacon is reachable");

    // Assert
    assert_eq!(ad.ip_address, "127.0.0.1");
    assert_eq!(ad.port, 1883);

    running.store(false, Ordering::Relaxed);
    beacon.join();
}
