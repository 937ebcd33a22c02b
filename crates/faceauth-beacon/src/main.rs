//! faceauth-beacon entry point.
//!
//! Without a subcommand the binary runs the discovery beacon until Ctrl-C.
//! `locate` runs the client side once and prints the advertisement found.
//!
//! # Usage
//!
//! ```text
//! faceauth-beacon [OPTIONS] [COMMAND]
//!
//! Commands:
//!   locate  Broadcast WHO_IS and print the first matching advertisement
//!
//! Options:
//!   --name <NAME>                 Service name [default: face-broker]
//!   --port <PORT>                 Discovery UDP port [default: 18830]
//!   --broker-port <PORT>          Advertised broker port [default: 1883]
//!   --beacon-ip <IP>              Address to advertise instead of auto-detecting
//!   --broadcast-addr <IP>         Broadcast destination [default: 255.255.255.255]
//!   --interval-ms <MS>            Broadcast interval [default: 2000]
//! ```

use std::net::Ipv4Addr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use faceauth_beacon::domain::BeaconConfig;
use faceauth_beacon::infrastructure::network::{
    locate, start_beacon, HostAddressResolver, LocatorConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// LAN discovery beacon for the face-authentication broker.
#[derive(Debug, Parser)]
#[command(name = "faceauth-beacon", version)]
struct Cli {
    /// Service name answered to and advertised.
    #[arg(long, default_value = "face-broker", env = "BEACON_NAME")]
    name: String,

    /// UDP discovery port.
    #[arg(long, default_value_t = 18830, env = "BEACON_PORT")]
    port: u16,

    /// Port advertised to clients.
    #[arg(long, default_value_t = 1883, env = "BROKER_PORT")]
    broker_port: u16,

    /// Address to advertise.  Auto-detected when absent or empty.
    #[arg(long, env = "BEACON_IP")]
    beacon_ip: Option<String>,

    /// Destination of periodic advertisements and WHO_IS queries.
    #[arg(long, default_value = "255.255.255.255", env = "BEACON_BROADCAST_ADDR")]
    broadcast_addr: Ipv4Addr,

    /// Milliseconds between two periodic advertisements.
    #[arg(long, default_value_t = 2000, env = "BEACON_INTERVAL_MS")]
    interval_ms: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Broadcast WHO_IS and print the first matching advertisement.
    Locate {
        /// Seconds to wait before giving up.
        #[arg(long, default_value_t = 5)]
        wait_secs: u64,
    },
}

impl Cli {
    /// Converts the parsed arguments into a [`BeaconConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--beacon-ip` is set but is not an IPv4 address.
    fn into_beacon_config(&self) -> anyhow::Result<BeaconConfig> {
        let address_override = match self.beacon_ip.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(ip) => Some(
                ip.parse::<Ipv4Addr>()
                    .with_context(|| format!("invalid --beacon-ip '{ip}'"))?,
            ),
        };
        Ok(BeaconConfig {
            service_name: self.name.clone(),
            discovery_port: self.port,
            advertised_port: self.broker_port,
            address_override,
            broadcast_addr: self.broadcast_addr,
            broadcast_interval: Duration::from_millis(self.interval_ms),
            ..BeaconConfig::default()
        })
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
    let config = cli.into_beacon_config()?;

    if let Some(Command::Locate { wait_secs }) = cli.command {
        let locator = LocatorConfig {
            service_name: config.service_name.clone(),
            discovery_port: config.discovery_port,
            broadcast_addr: config.broadcast_addr,
            wait: Duration::from_secs(wait_secs),
            ..LocatorConfig::default()
        };
        let ad = tokio::task::spawn_blocking(move || locate(&locator))
            .await
            .context("locator task failed")??;
        println!("{}", String::from_utf8_lossy(&ad.to_datagram()));
        return Ok(());
    }

    info!(
        "beacon starting: name={} port={} broker_port={}",
        config.service_name, config.discovery_port, config.advertised_port
    );

    let running = Arc::new(AtomicBool::new(true));
    let resolver = HostAddressResolver::new(config.address_override);
    let handle = start_beacon(&config, resolver, Arc::clone(&running))
        .context("failed to start discovery beacon")?;

    // ── Ctrl-C / SIGTERM handler ──────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    tokio::task::spawn_blocking(move || handle.join())
        .await
        .context("beacon thread join failed")?;
    info!("beacon stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        // Arrange / Act
        let cli = Cli::parse_from(["faceauth-beacon"]);

        // Assert
        assert_eq!(cli.name, "face-broker");
        assert_eq!(cli.port, 18830);
        assert_eq!(cli.broker_port, 1883);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_beacon_ip_override_is_parsed() {
        let cli = Cli::parse_from(["faceauth-beacon", "--beacon-ip", "192.168.4.2"]);
        let cfg = cli.into_beacon_config().unwrap();
        assert_eq!(cfg.address_override, Some(Ipv4Addr::new(192, 168, 4, 2)));
    }

    #[test]
    fn test_blank_beacon_ip_means_auto_detect() {
        let cli = Cli::parse_from(["faceauth-beacon", "--beacon-ip", "  "]);
        let cfg = cli.into_beacon_config().unwrap();
        assert!(cfg.address_override.is_none());
    }

    #[test]
    fn test_invalid_beacon_ip_is_error() {
        let cli = Cli::parse_from(["faceauth-beacon", "--beacon-ip", "not.an.ip"]);
        assert!(cli.into_beacon_config().is_err());
    }

    #[test]
    fn test_interval_flag_sets_broadcast_interval() {
        let cli = Cli::parse_from(["faceauth-beacon", "--interval-ms", "500"]);
        let cfg = cli.into_beacon_config().unwrap();
        assert_eq!(cfg.broadcast_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_locate_subcommand_parses() {
        let cli = Cli::parse_from(["faceauth-beacon", "locate", "--wait-secs", "3"]);
        assert!(matches!(cli.command, Some(Command::Locate { wait_secs: 3 })));
    }
}
