//! # Matchmaking Relay
//!
//! Thin UDP relay between pairs of game clients. Unlike an authoritative
//! game server, the relay holds no simulation: both peers run their own
//! physics and reconcile each other's state; the relay only pairs them
//! up, hands both the shared match seed, and forwards opaque payloads
//! until one side leaves or goes silent.
//!
//! ## Architecture
//!
//! Single coordinating loop plus three tasks, all on the tokio runtime:
//! - **Receiver**: reads datagrams, decodes the control envelope, queues
//!   them for the main loop
//! - **Sender**: drains the outgoing envelope queue to the socket
//! - **Timeout checker**: sweeps peers silent for 5 seconds and tells
//!   the surviving partner
//!
//! All lobby state is behind a single `RwLock`; the main loop is the
//! only writer apart from the sweep, so contention is negligible at the
//! two-peers-per-match scale this serves.

pub mod lobby;
pub mod network;
