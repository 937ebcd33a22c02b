//! Network infrastructure for the beacon.
//!
//! # Sub-modules
//!
//! - **`discovery`** – Binds the discovery port and runs the cooperative
//!   broadcast/respond loop on a dedicated thread.
//!
//! - **`host_address`** – Finds the address this host is reachable at,
//!   either from an explicit override or from the outbound-interface lookup.
//!
//! - **`locator`** – The client side: broadcasts `WHO_IS` and waits for a
//!   matching advertisement.

pub mod discovery;
pub mod host_address;
pub mod locator;

pub use discovery::{start_beacon, BeaconHandle, DiscoveryError};
pub use host_address::HostAddressResolver;
pub use locator::{locate, LocatorConfig};
