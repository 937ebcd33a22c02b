//! Bridge configuration types.
//!
//! [`BridgeConfig`] holds the connection settings and is built once at
//! startup from CLI arguments.  [`ScanSettings`] holds what the bridge asks
//! the detection service for on every request; it may come from a TOML file
//! in which every field is optional:
//!
//! ```toml
//! persons_dir = "/data/persons"
//! annotated_dir = "/data/caps"
//! max_seconds = 8.0
//! stop_on_first = true
//! detect_timeout_secs = 35
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use faceauth_core::protocol::discovery::{DEFAULT_BROKER_PORT, DEFAULT_DISCOVERY_PORT, DEFAULT_SERVICE_NAME};
use faceauth_core::ScanRequest;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scan settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Connection settings of the bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Broker host.  `None` means "find it with the discovery beacon".
    pub broker_host: Option<String>,
    pub broker_port: u16,
    pub client_id: String,
    /// Base URL of the detection service.
    pub detection_url: String,
    /// Service name asked for when discovering the broker.
    pub discovery_name: String,
    pub discovery_port: u16,
    pub discovery_wait: Duration,
    /// Pause before polling the broker again after a connection error.
    pub reconnect_delay: Duration,
}

impl Default for BridgeConfig {
    /// | Field            | Default                  |
    /// |------------------|--------------------------|
    /// | broker_host      | discovered               |
    /// | broker_port      | `1883`                   |
    /// | client_id        | `face-auth-bridge`       |
    /// | detection_url    | `http://localhost:8000`  |
    /// | discovery_name   | `face-broker`            |
    /// | discovery_port   | `18830`                  |
    /// | discovery_wait   | 5 seconds                |
    /// | reconnect_delay  | 2 seconds                |
    fn default() -> Self {
        Self {
            broker_host: None,
            broker_port: DEFAULT_BROKER_PORT,
            client_id: "face-auth-bridge".to_string(),
            detection_url: "http://localhost:8000".to_string(),
            discovery_name: DEFAULT_SERVICE_NAME.to_string(),
            discovery_port: DEFAULT_DISCOVERY_PORT,
            discovery_wait: Duration::from_secs(5),
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

fn default_persons_dir() -> String {
    "persons".to_string()
}

fn default_annotated_dir() -> Option<String> {
    Some("captures".to_string())
}

fn default_tolerance() -> f64 {
    0.6
}

fn default_max_seconds() -> f64 {
    8.0
}

fn default_frame_stride() -> u32 {
    1
}

fn default_stop_on_first() -> bool {
    true
}

fn default_detect_timeout_secs() -> u64 {
    35
}

fn default_release_timeout_secs() -> u64 {
    5
}

fn default_dedup_ttl_secs() -> u64 {
    60
}

fn default_dedup_capacity() -> usize {
    256
}

/// Per-request scan parameters and transaction limits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScanSettings {
    #[serde(default = "default_persons_dir")]
    pub persons_dir: String,
    #[serde(default = "default_annotated_dir")]
    pub annotated_dir: Option<String>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_seconds")]
    pub max_seconds: f64,
    #[serde(default)]
    pub max_frames: Option<u32>,
    #[serde(default = "default_frame_stride")]
    pub frame_stride: u32,
    #[serde(default = "default_stop_on_first")]
    pub stop_on_first: bool,
    /// Bound on camera warm-up plus the whole scan.
    #[serde(default = "default_detect_timeout_secs")]
    pub detect_timeout_secs: u64,
    #[serde(default = "default_release_timeout_secs")]
    pub release_timeout_secs: u64,
    /// How long a `requestId` is remembered for redelivery detection.
    #[serde(default = "default_dedup_ttl_secs")]
    pub dedup_ttl_secs: u64,
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            persons_dir: default_persons_dir(),
            annotated_dir: default_annotated_dir(),
            tolerance: default_tolerance(),
            max_seconds: default_max_seconds(),
            max_frames: None,
            frame_stride: default_frame_stride(),
            stop_on_first: default_stop_on_first(),
            detect_timeout_secs: default_detect_timeout_secs(),
            release_timeout_secs: default_release_timeout_secs(),
            dedup_ttl_secs: default_dedup_ttl_secs(),
            dedup_capacity: default_dedup_capacity(),
        }
    }
}

impl ScanSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The body sent to `/detect-webcam`.
    pub fn to_scan_request(&self) -> ScanRequest {
        ScanRequest {
            tolerance: self.tolerance,
            max_seconds: self.max_seconds,
            max_frames: self.max_frames,
            frame_stride: self.frame_stride,
            stop_on_first: self.stop_on_first,
            annotated_dir: self.annotated_dir.clone().filter(|d| !d.trim().is_empty()),
            ..ScanRequest::new(self.persons_dir.clone())
        }
    }

    pub fn detect_timeout(&self) -> Duration {
        Duration::from_secs(self.detect_timeout_secs)
    }

    pub fn release_timeout(&self) -> Duration {
        Duration::from_secs(self.release_timeout_secs)
    }

    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.dedup_ttl_secs)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
