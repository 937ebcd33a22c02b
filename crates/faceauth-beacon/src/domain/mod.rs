//! Domain types for the discovery beacon.

pub mod config;

pub use config::BeaconConfig;
