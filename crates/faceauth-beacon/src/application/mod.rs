//! Application layer of the beacon.
//!
//! - **`advertise`** – Decides when to broadcast, what to advertise, and
//!   which inbound datagrams deserve a unicast reply.  Depends only on the
//!   [`advertise::AddressResolver`] trait, never on sockets.

pub mod advertise;
