//! Discovery datagrams exchanged on the UDP discovery port.
//!
//! Two payloads exist:
//!
//! ```text
//! client → broadcast:     {"type":"WHO_IS","name":"face-broker"}
//! beacon → client/bcast:  {"name":"face-broker","ip":"192.168.1.7","port":1883}
//! ```
//!
//! The beacon sends the advertisement both periodically (broadcast) and as a
//! unicast reply to a matching query.  Clients accept either.

use serde::{Deserialize, Serialize};

use super::ProtocolError;

/// Default UDP port the beacon listens and broadcasts on.
pub const DEFAULT_DISCOVERY_PORT: u16 = 18830;

/// Default service name advertised by the beacon.
pub const DEFAULT_SERVICE_NAME: &str = "face-broker";

/// Default port advertised for the broker itself (standard MQTT).
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Value of the `type` field in a discovery query.
pub const WHO_IS: &str = "WHO_IS";

/// Largest datagram either side needs to read.
pub const MAX_DATAGRAM_LEN: usize = 512;

/// A client's request to locate a named service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryQuery {
    /// Always [`WHO_IS`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Name of the service the client is looking for.
    #[serde(rename = "name")]
    pub target_name: String,
}

impl DiscoveryQuery {
    /// Builds a `WHO_IS` query for `target_name`.
    pub fn who_is(target_name: impl Into<String>) -> Self {
        Self {
            kind: WHO_IS.to_string(),
            target_name: target_name.into(),
        }
    }

    /// Parses a raw datagram as a query.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] for non-JSON or wrongly shaped
    /// datagrams and [`ProtocolError::InvalidField`] when `type` is not
    /// `WHO_IS`.
    pub fn from_datagram(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let query: Self = serde_json::from_slice(bytes)?;
        if query.kind != WHO_IS {
            return Err(ProtocolError::InvalidField(format!(
                "unexpected query type '{}'",
                query.kind
            )));
        }
        Ok(query)
    }

    /// Returns `true` when this query is addressed to `service_name`.
    pub fn targets(&self, service_name: &str) -> bool {
        self.target_name == service_name
    }

    /// Serializes the query into datagram bytes.
    pub fn to_datagram(&self) -> Vec<u8> {
        // Serializing a struct of two strings cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// A service's reachable address, as broadcast or sent in reply to a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryAdvertisement {
    /// Name of the advertised service.
    #[serde(rename = "name")]
    pub service_name: String,
    /// Dotted-quad address clients should connect to.
    #[serde(rename = "ip")]
    pub ip_address: String,
    /// Port the service listens on.
    pub port: u16,
}

impl DiscoveryAdvertisement {
    /// Parses a raw datagram as an advertisement.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] if the datagram is not a valid
    /// advertisement object.
    pub fn from_datagram(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serializes the advertisement into datagram bytes.
    pub fn to_datagram(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_who_is_serializes_to_wire_shape() {
        // Arrange
        let query = DiscoveryQuery::who_is("face-broker");

        // Act
        let json: serde_json::Value = serde_json::from_slice(&query.to_datagram()).unwrap();

        // Assert
        assert_eq!(json["type"], "WHO_IS");
        assert_eq!(json["name"], "face-broker");
    }

    #[test]
    fn test_query_parses_from_client_datagram() {
        let query = DiscoveryQuery::from_datagram(br#"{"type":"WHO_IS","name":"face-broker"}"#)
            .expect("valid query");
        assert!(query.targets("face-broker"));
        assert!(!query.targets("other-service"));
    }

    #[test]
    fn test_query_with_wrong_type_is_rejected() {
        let result = DiscoveryQuery::from_datagram(br#"{"type":"I_AM","name":"face-broker"}"#);
        assert!(matches!(result, Err(ProtocolError::InvalidField(_))));
    }

    #[test]
    fn test_advertisement_is_not_mistaken_for_query() {
        // The beacon receives its own broadcasts; they must not parse as queries.
        let ad = DiscoveryAdvertisement {
            service_name: "face-broker".to_string(),
            ip_address: "10.0.0.4".to_string(),
            port: 1883,
        };
        assert!(DiscoveryQuery::from_datagram(&ad.to_datagram()).is_err());
    }

    #[test]
    fn test_garbage_datagram_is_malformed() {
        let result = DiscoveryQuery::from_datagram(&[0xFF, 0x00, 0x13]);
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_advertisement_wire_field_names() {
        let ad = DiscoveryAdvertisement {
            service_name: "face-broker".to_string(),
            ip_address: "192.168.1.7".to_string(),
            port: 1883,
        };
        let text = String::from_utf8(ad.to_datagram()).unwrap();
        assert_eq!(text, r#"{"name":"face-broker","ip":"192.168.1.7","port":1883}"#);
    }
}
