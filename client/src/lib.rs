//! # Game Client
//!
//! Per-peer game binary: every client runs the full simulation locally
//! and replicates with its opponent through the relay. There is no
//! authoritative server; consistency comes from the authority and
//! reconciliation rules in the `shared` crate.
//!
//! ## Module organization
//!
//! - `network`: the replication channel. A background thread owns the
//!   UDP socket on a small tokio runtime; the game loop drains arrivals
//!   once per fixed tick and sends fire-and-forget.
//! - `input`: keyboard sampling with per-tick edge detection for kick
//!   and restart.
//! - `game`: the frame/tick bridge. Accumulates render frame time into
//!   fixed 60 Hz ticks, feeds the session pipeline, handles relay
//!   control traffic (join, match start, peer loss, restart).
//! - `rendering`: macroquad immediate-mode drawing of the pitch, both
//!   teams, the ball, power-ups, scoreboard and phase overlays.
//!
//! The session itself (authority, reconciliation, events, score, clock)
//! lives in `shared::session` so the same pipeline is exercised by the
//! headless simulation tests.

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
