//! faceauth-detection entry point.
//!
//! Wires the replay camera, the fingerprint detector, and the filesystem
//! adapters into a [`DetectionService`] and serves the HTTP API until
//! Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! faceauth-detection [OPTIONS]
//!
//! Options:
//!   --bind <ADDR>               HTTP listen address [default: 0.0.0.0:8000]
//!   --persons-dir <DIR>         Default persons directory [default: persons]
//!   --frames-dir <DIR>          Frames replayed as the camera [default: frames]
//!   --no-loop                   Stall after the last frame instead of looping
//!   --frame-interval-ms <MS>    Pause between replayed frames [default: 33]
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use faceauth_detection::application::detection_service::DetectionService;
use faceauth_detection::application::device_session::DeviceSession;
use faceauth_detection::domain::DetectionServiceConfig;
use faceauth_detection::infrastructure::{
    camera::ReplayDeviceOpener,
    detector::FingerprintDetector,
    http_api,
    storage::{DirectoryArchive, DirectoryReferenceLoader},
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Camera session and detection HTTP API for LAN face authentication.
#[derive(Debug, Parser)]
#[command(name = "faceauth-detection", version)]
struct Cli {
    /// HTTP listen address.
    #[arg(long, default_value = "0.0.0.0:8000", env = "DETECTION_BIND")]
    bind: SocketAddr,

    /// Persons directory used when a request leaves it blank.
    #[arg(long, default_value = "persons", env = "PERSONS_DIR")]
    persons_dir: PathBuf,

    /// Directory of frame files replayed as the camera.
    #[arg(long, default_value = "frames", env = "FRAMES_DIR")]
    frames_dir: PathBuf,

    /// Stall after the last frame instead of starting over.
    #[arg(long)]
    no_loop: bool,

    /// Milliseconds between two replayed frames.
    #[arg(long, default_value_t = 33, env = "FRAME_INTERVAL_MS")]
    frame_interval_ms: u64,
}

impl Cli {
    fn to_config(&self) -> DetectionServiceConfig {
        DetectionServiceConfig {
            bind_addr: self.bind,
            persons_dir: self.persons_dir.clone(),
            frames_dir: self.frames_dir.clone(),
            replay_loop: !self.no_loop,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.to_config();
    info!(
        "detection service starting: frames={} persons={}",
        config.frames_dir.display(),
        config.persons_dir.display()
    );

    let opener = ReplayDeviceOpener::new(&config.frames_dir, config.replay_loop)
        .with_frame_interval(Duration::from_millis(cli.frame_interval_ms));
    let service = DetectionService::new(
        DeviceSession::new(Box::new(opener)),
        Arc::new(FingerprintDetector::new()),
        Arc::new(DirectoryReferenceLoader::new()),
        Arc::new(DirectoryArchive::new()),
    )
    .with_default_persons_dir(&config.persons_dir);
    let service = Arc::new(service);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    // ── Ctrl-C / SIGTERM handler ──────────────────────────────────────────────
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    };

    http_api::serve(listener, Arc::clone(&service), shutdown).await?;

    // The camera stays open between requests; close it on the way out.
    let status = tokio::task::spawn_blocking(move || service.release())
        .await
        .context("release task failed")?;
    info!(?status, "detection service stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
