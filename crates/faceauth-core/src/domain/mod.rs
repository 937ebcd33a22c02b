//! Domain entities for LAN face authentication.
//!
//! This module contains pure detection logic with no infrastructure
//! dependencies: no camera, no filesystem, no sockets.  Everything here can be
//! compiled and tested on any platform without external setup.
//!
//! The outer crates depend on these types; the domain never depends on them.

/// Identities, per-face matches, and the loop summary.
///
/// See [`detection::LoopSummary`] for the main type.
pub mod detection;
