//! Infrastructure layer for the bridge.
//!
//! - **`detection_client`** – `DetectionBoundary` over HTTP (reqwest).
//! - **`mqtt_bus`** – `AuthPublisher` and the broker event loop (rumqttc).

pub mod detection_client;
pub mod mqtt_bus;

pub use detection_client::HttpDetectionClient;
pub use mqtt_bus::MqttPublisher;
