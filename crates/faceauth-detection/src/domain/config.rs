//! Detection service configuration.
//!
//! [`DetectionServiceConfig`] is built once at startup from CLI arguments
//! (see `main.rs`) or from defaults in tests.

use std::net::SocketAddr;
use std::path::PathBuf;

/// All runtime settings of the detection service.
#[derive(Debug, Clone)]
pub struct DetectionServiceConfig {
    /// Address the HTTP API listens on.
    pub bind_addr: SocketAddr,
    /// Persons directory used when a scan request does not name one.
    pub persons_dir: PathBuf,
    /// Directory of frame files replayed by the capture device.
    pub frames_dir: PathBuf,
    /// Restart the replay from the first file after the last one.
    pub replay_loop: bool,
}

impl Default for DetectionServiceConfig {
    /// | Field        | Default          |
    /// |--------------|------------------|
    /// | bind_addr    | `0.0.0.0:8000`   |
    /// | persons_dir  | `persons`        |
    /// | frames_dir   | `frames`         |
    /// | replay_loop  | `true`           |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            persons_dir: PathBuf::from("persons"),
            frames_dir: PathBuf::from("frames"),
            replay_loop: true,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_matches_bridge_default_url() {
        // The bridge defaults to http://localhost:8000.
        let cfg = DetectionServiceConfig::default();
        assert_eq!(cfg.bind_addr.port(), 8000);
    }

    #[test]
    fn test_default_directories() {
        let cfg = DetectionServiceConfig::default();
        assert_eq!(cfg.persons_dir, PathBuf::from("persons"));
        assert_eq!(cfg.frames_dir, PathBuf::from("frames"));
        assert!(cfg.replay_loop);
    }
}
