//! Integration tests for the JSON wire formats.
//!
//! These pin the exact payloads other processes (the mobile app, the broker
//! clients, the detection service) read and write, through the public API.

use faceauth_core::protocol::{
    auth::{TOPIC_REQUEST, TOPIC_RESPONSE, TOPIC_STATUS},
    ReleaseOutcome, ReleaseStatus, ScanRequest,
};
use faceauth_core::{
    AuthRequest, AuthResponse, AuthStatus, DiscoveryAdvertisement, DiscoveryQuery, LabelCounts,
    LoopSummary, StatusUpdate, StopReason,
};
use serde_json::Value;

#[test]
fn test_topic_names() {
    assert_eq!(TOPIC_REQUEST, "home/auth/face/request");
    assert_eq!(TOPIC_RESPONSE, "home/auth/face/response");
    assert_eq!(TOPIC_STATUS, "home/auth/face/status");
}

#[test]
fn test_discovery_exchange_between_client_and_beacon() {
    // Arrange: what a client broadcasts
    let query_bytes = DiscoveryQuery::who_is("face-broker").to_datagram();

    // Act: the beacon decodes it and answers
    let query = DiscoveryQuery::from_datagram(&query_bytes).unwrap();
    let reply = DiscoveryAdvertisement {
        service_name: "face-broker".to_string(),
        ip_address: "192.168.0.20".to_string(),
        port: 1883,
    };
    let decoded = DiscoveryAdvertisement::from_datagram(&reply.to_datagram()).unwrap();

    // Assert
    assert!(query.targets("face-broker"));
    assert_eq!(decoded, reply);
}

#[test]
fn test_status_update_wire_shape() {
    let update = StatusUpdate::new(AuthStatus::Scanning, "look at the camera");
    let json: Value = serde_json::to_value(&update).unwrap();
    let obj = json.as_object().unwrap();
    assert_eq!(obj.len(), 3);
    assert_eq!(obj["status"], "scanning");
    assert!(obj["timestamp"].is_f64());
}

#[test]
fn test_failed_response_decodes_from_app_perspective() {
    // A consumer of the response topic only needs success, requestId and error.
    let resp = AuthResponse::rejected("r-9", "Face detection timeout");
    let bytes = serde_json::to_vec(&resp).unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["requestId"], "r-9");
    assert_eq!(json["error"], "Face detection timeout");
}

#[test]
fn test_request_from_app_with_only_user_id() {
    let req = AuthRequest::from_payload(br#"{"userId":"alice"}"#).unwrap();
    assert_eq!(req.user_id, "alice");
    assert!(!req.request_id.is_empty());
}

#[test]
fn test_scan_request_body_as_sent_by_bridge() {
    let mut req = ScanRequest::new("persons");
    req.max_seconds = 8.0;
    req.stop_on_first = true;
    req.frame_stride = 1;

    let json = serde_json::to_value(&req).unwrap();

    assert_eq!(json["persons_dir"], "persons");
    assert_eq!(json["max_seconds"], 8.0);
    assert_eq!(json["stop_on_first"], true);
    assert_eq!(json["frame_stride"], 1);
    assert_eq!(json["tolerance"], 0.6);
}

#[test]
fn test_summary_from_service_preserves_discovery_order() {
    // Arrange: the service saw bob first, then alice twice
    let body = r#"{
        "frames_processed": 3,
        "names_seen": [{"label":"bob","count":1},{"label":"alice","count":2}],
        "unknown_frames": 0,
        "stop_reason": "stop_on_first_match",
        "last_annotated_frame": "captures/frame_000003.jpg"
    }"#;

    // Act
    let summary: LoopSummary = serde_json::from_str(body).unwrap();

    // Assert
    assert_eq!(summary.first_positive_label(), Some("bob"));
    assert_eq!(summary.names_seen.get("alice"), 2);
    assert_eq!(summary.stop_reason, StopReason::StopOnFirstMatch);
    assert!(summary.timeline.is_none());
}

#[test]
fn test_summary_round_trips_through_json() {
    let mut names_seen = LabelCounts::new();
    names_seen.increment("carol");
    let summary = LoopSummary {
        frames_processed: 7,
        names_seen,
        unknown_frames: 2,
        stop_reason: StopReason::Timeout,
        last_annotated_frame: None,
        timeline: Some(Vec::new()),
    };
    let back: LoopSummary =
        serde_json::from_str(&serde_json::to_string(&summary).unwrap()).unwrap();
    assert_eq!(back, summary);
}

#[test]
fn test_release_outcome_released() {
    let json = serde_json::to_value(ReleaseOutcome::from(ReleaseStatus::Released)).unwrap();
    assert_eq!(json["status"], "released");
}
