//! faceauth-bridge entry point.
//!
//! # Usage
//!
//! ```text
//! faceauth-bridge [OPTIONS]
//!
//! Options:
//!   --broker <HOST>            Broker host; discovered on the LAN when empty
//!   --broker-port <PORT>       Broker port [default: 1883]
//!   --face-api-url <URL>       Detection service [default: http://localhost:8000]
//!   --client-id <ID>           MQTT client id [default: face-auth-bridge]
//!   --scan-config <PATH>       TOML file of scan settings
//!   --persons-dir <DIR>        Overrides persons_dir from the scan settings
//!   --captures-dir <DIR>       Overrides annotated_dir from the scan settings
//!   --discovery-name <NAME>    Service name to discover [default: face-broker]
//!   --discovery-port <PORT>    Discovery UDP port [default: 18830]
//!   --discovery-wait <SECS>    Discovery timeout [default: 5]
//! ```
//!
//! Scan settings are layered: built-in defaults, then the `--scan-config`
//! file, then `--persons-dir` / `--captures-dir`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use faceauth_beacon::infrastructure::network::{locate, LocatorConfig};
use faceauth_bridge::application::AuthBridge;
use faceauth_bridge::domain::{BridgeConfig, ScanSettings};
use faceauth_bridge::infrastructure::{mqtt_bus, HttpDetectionClient, MqttPublisher};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Bridges face-authentication requests on the broker to the detection service.
#[derive(Debug, Parser)]
#[command(name = "faceauth-bridge", version)]
struct Cli {
    /// Broker host.  Found with the discovery beacon when absent or empty.
    #[arg(long, env = "MQTT_BROKER")]
    broker: Option<String>,

    #[arg(long, default_value_t = 1883, env = "MQTT_PORT")]
    broker_port: u16,

    /// Base URL of the detection service.
    #[arg(long, default_value = "http://localhost:8000", env = "FACE_API_URL")]
    face_api_url: String,

    #[arg(long, default_value = "face-auth-bridge", env = "MQTT_CLIENT_ID")]
    client_id: String,

    /// TOML file of scan settings; every field is optional.
    #[arg(long, env = "SCAN_CONFIG")]
    scan_config: Option<PathBuf>,

    #[arg(long, env = "PERSONS_DIR")]
    persons_dir: Option<String>,

    /// Directory annotated frames are written to.  Empty disables it.
    #[arg(long, env = "CAPTURES_DIR")]
    captures_dir: Option<String>,

    #[arg(long, default_value = "face-broker", env = "DISCOVERY_NAME")]
    discovery_name: String,

    #[arg(long, default_value_t = 18830, env = "DISCOVERY_PORT")]
    discovery_port: u16,

    /// Seconds to wait for a discovery answer.
    #[arg(long, default_value_t = 5, env = "DISCOVERY_WAIT")]
    discovery_wait: u64,
}

impl Cli {
    fn to_bridge_config(&self) -> BridgeConfig {
        let broker_host = self
            .broker
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_string);
        BridgeConfig {
            broker_host,
            broker_port: self.broker_port,
            client_id: self.client_id.clone(),
            detection_url: self.face_api_url.clone(),
            discovery_name: self.discovery_name.clone(),
            discovery_port: self.discovery_port,
            discovery_wait: Duration::from_secs(self.discovery_wait),
            ..BridgeConfig::default()
        }
    }

    /// Builds the scan settings: defaults, then the TOML file, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if `--scan-config` names an unreadable or invalid file.
    fn to_scan_settings(&self) -> anyhow::Result<ScanSettings> {
        let mut settings = match &self.scan_config {
            Some(path) => ScanSettings::load(path)
                .with_context(|| format!("failed to load scan settings from {}", path.display()))?,
            None => ScanSettings::default(),
        };
        if let Some(dir) = &self.persons_dir {
            settings.persons_dir = dir.clone();
        }
        if let Some(dir) = &self.captures_dir {
            settings.annotated_dir = Some(dir.clone()).filter(|d| !d.trim().is_empty());
        }
        Ok(settings)
    }
}

/// Returns the configured broker, or asks the discovery beacon for one.
async fn resolve_broker(config: &BridgeConfig) -> anyhow::Result<(String, u16)> {
    if let Some(host) = &config.broker_host {
        return Ok((host.clone(), config.broker_port));
    }

    info!(
        "no broker configured; discovering '{}' on UDP {}",
        config.discovery_name, config.discovery_port
    );
    let locator = LocatorConfig {
        service_name: config.discovery_name.clone(),
        discovery_port: config.discovery_port,
        wait: config.discovery_wait,
        ..LocatorConfig::default()
    };
    let ad = tokio::task::spawn_blocking(move || locate(&locator))
        .await
        .context("locator task failed")?
        .context("broker discovery failed")?;
    info!("discovered broker at {}:{}", ad.ip_address, ad.port);
    Ok((ad.ip_address, ad.port))
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
    let config = cli.to_bridge_config();
    let settings = cli.to_scan_settings()?;

    let (host, port) = resolve_broker(&config).await?;
    info!(
        "bridge starting: broker={host}:{port} detection={} persons_dir={}",
        config.detection_url, settings.persons_dir
    );

    let boundary = HttpDetectionClient::new(&config.detection_url, settings.release_timeout())
        .context("failed to build detection client")?;
    let (client, eventloop) = mqtt_bus::connect(&config, &host, port);
    let publisher = MqttPublisher::new(client.clone());
    let bridge = Arc::new(AuthBridge::new(
        Arc::new(boundary),
        Arc::new(publisher),
        &settings,
    ));

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    };
    mqtt_bus::run(client, eventloop, bridge, config.reconnect_delay, shutdown).await;

    info!("bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
