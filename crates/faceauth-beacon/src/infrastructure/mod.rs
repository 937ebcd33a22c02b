//! Infrastructure layer for the beacon.
//!
//! Contains the OS-facing adapters: the discovery socket loop, host address
//! resolution, and the client-side locator.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `faceauth_core`, but MUST NOT be imported by them.

pub mod network;
