//! Advertisement policy: the broadcast schedule and the query filter.
//!
//! The socket loop in `infrastructure::network::discovery` asks this module two
//! questions on every iteration: "is a periodic broadcast due?" and "does
//! this datagram deserve a reply?".  Keeping the answers here keeps them
//! testable without a network.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use faceauth_core::{DiscoveryAdvertisement, DiscoveryQuery};
use tracing::{debug, warn};

use crate::domain::BeaconConfig;

/// Source of the address advertised to clients.
///
/// Implementations may fail transiently (no route, interface down); the
/// advertiser skips that tick and asks again on the next one.
pub trait AddressResolver: Send {
    /// Returns this host's outward-facing IPv4 address, if one can be found.
    fn resolve(&self) -> Option<Ipv4Addr>;
}

/// Builds advertisements and tracks the periodic broadcast schedule.
pub struct Advertiser<R: AddressResolver> {
    service_name: String,
    advertised_port: u16,
    interval: Duration,
    resolver: R,
    last_broadcast: Option<Instant>,
}

impl<R: AddressResolver> Advertiser<R> {
    pub fn new(config: &BeaconConfig, resolver: R) -> Self {
        Self {
            service_name: config.service_name.clone(),
            advertised_port: config.advertised_port,
            interval: config.broadcast_interval,
            resolver,
            last_broadcast: None,
        }
    }

    /// Returns `true` when the next periodic broadcast should go out.
    ///
    /// The first broadcast is due immediately.
    pub fn broadcast_due(&self, now: Instant) -> bool {
        match self.last_broadcast {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Records that the tick at `now` has been handled, whether or not a
    /// datagram actually went out.
    pub fn mark_broadcast(&mut self, now: Instant) {
        self.last_broadcast = Some(now);
    }

    /// The advertisement for this host, or `None` when the address cannot be
    /// resolved right now.
    pub fn advertisement(&self) -> Option<DiscoveryAdvertisement> {
        match self.resolver.resolve() {
            Some(ip) => Some(DiscoveryAdvertisement {
                service_name: self.service_name.clone(),
                ip_address: ip.to_string(),
                port: self.advertised_port,
            }),
            None => {
                warn!(service = %self.service_name, "host address unavailable; skipping advertisement");
                None
            }
        }
    }

    /// The reply owed to `datagram`, if it is a `WHO_IS` for this service.
    ///
    /// Malformed datagrams, other services' queries, and advertisements
    /// (including this beacon's own broadcasts) yield `None`.
    pub fn reply_to(&self, datagram: &[u8]) -> Option<DiscoveryAdvertisement> {
        match DiscoveryQuery::from_datagram(datagram) {
            Ok(query) if query.targets(&self.service_name) => self.advertisement(),
            Ok(query) => {
                debug!(target_name = %query.target_name, "ignoring query for another service");
                None
            }
            Err(e) => {
                debug!("ignoring non-query datagram: {e}");
                None
            }
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedResolver(Option<Ipv4Addr>);

    impl AddressResolver for FixedResolver {
        fn resolve(&self) -> Option<Ipv4Addr> {
            self.0
        }
    }

    fn advertiser(ip: Option<Ipv4Addr>) -> Advertiser<FixedResolver> {
        Advertiser::new(&BeaconConfig::default(), FixedResolver(ip))
    }

    #[test]
    fn test_first_broadcast_is_due_immediately() {
        // Arrange
        let adv = advertiser(Some(Ipv4Addr::LOCALHOST));

        // Act / Assert
        assert!(adv.broadcast_due(Instant::now()));
    }

    #[test]
    fn test_broadcast_not_due_within_interval() {
        let mut adv = advertiser(Some(Ipv4Addr::LOCALHOST));
        let t0 = Instant::now();
        adv.mark_broadcast(t0);

        assert!(!adv.broadcast_due(t0 + Duration::from_millis(1999)));
        assert!(adv.broadcast_due(t0 + Duration::from_secs(2)));
    }

    #[test]
    fn test_advertisement_carries_resolved_address_and_broker_port() {
        let adv = advertiser(Some(Ipv4Addr::new(192, 168, 1, 7)));

        let ad = adv.advertisement().expect("address resolves");

        assert_eq!(ad.service_name, "face-broker");
        assert_eq!(ad.ip_address, "192.168.1.7");
        assert_eq!(ad.port, 1883);
    }

    #[test]
    fn test_unresolvable_address_skips_advertisement() {
        let adv = advertiser(None);
        assert!(adv.advertisement().is_none());
    }

    #[test]
    fn test_matching_query_gets_reply() {
        let adv = advertiser(Some(Ipv4Addr::new(10, 0, 0, 2)));
        let reply = adv.reply_to(br#"{"type":"WHO_IS","name":"face-broker"}"#);
        assert_eq!(reply.map(|a| a.ip_address), Some("10.0.0.2".to_string()));
    }

    #[test]
    fn test_query_for_other_service_is_ignored() {
        let adv = advertiser(Some(Ipv4Addr::LOCALHOST));
        assert!(adv
            .reply_to(br#"{"type":"WHO_IS","name":"printer"}"#)
            .is_none());
    }

    #[test]
    fn test_own_advertisement_is_ignored() {
        let adv = advertiser(Some(Ipv4Addr::LOCALHOST));
        let own = adv.advertisement().unwrap().to_datagram();
        assert!(adv.reply_to(&own).is_none());
    }

    #[test]
    fn test_garbage_is_ignored() {
        let adv = advertiser(Some(Ipv4Addr::LOCALHOST));
        assert!(adv.reply_to(b"\x00\x01not json").is_none());
    }
}
