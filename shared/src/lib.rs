//! Core library shared by both peers: wire protocol and codec, the
//! simulation oracle interface with the reference pitch physics, the
//! authority/reconciliation engine, discrete-event replication, and the
//! per-match session pipeline. The client binary drives a `Session`
//! against a `PitchPhysics`; the relay only ever touches `wire::Envelope`.

pub mod ai;
pub mod entity;
pub mod events;
pub mod math;
pub mod physics;
pub mod powerup;
pub mod reconcile;
pub mod session;
pub mod wire;

pub use entity::{side_of, ControllerRole, EntityId, Side, BALL_ID};
pub use math::Vec2;
pub use session::{MatchConfig, MatchOutcome, MatchPhase, Notice, PlayerCommand, Score, Session};
pub use wire::{Envelope, Message, PowerUpKind, Snapshot, WireError};

/// Fixed simulation and replication rate. Snapshots for every
/// locally-authoritative entity go out once per tick.
pub const TICK_RATE: u32 = 60;
pub const TICK_DT: f32 = 1.0 / TICK_RATE as f32;

// Pitch geometry. Top-down, origin at the top-left corner; home defends
// the left goal.
pub const PITCH_WIDTH: f32 = 800.0;
pub const PITCH_HEIGHT: f32 = 500.0;
pub const GOAL_MOUTH: f32 = 160.0;
pub const GOAL_DEPTH: f32 = 24.0;

pub const PLAYER_RADIUS: f32 = 16.0;
pub const BALL_RADIUS: f32 = 8.0;
pub const PLAYER_SPEED: f32 = 220.0;
pub const KICK_SPEED: f32 = 520.0;
pub const KICK_RANGE: f32 = PLAYER_RADIUS + BALL_RADIUS + 6.0;
pub const DRIBBLE_PUSH: f32 = 60.0;

/// Per-second fraction of ball velocity lost to rolling friction.
pub const BALL_FRICTION: f32 = 0.8;
pub const WALL_RESTITUTION: f32 = 0.7;

pub const TEAM_SIZE: usize = 2;

// Reconciliation tuning (see `reconcile`).
pub const MAX_SNAP_DISTANCE: f32 = 48.0;
pub const BLEND_ALPHA: f32 = 0.3;
pub const CONVERGE_EPSILON: f32 = 0.5;

/// Window after a kick during which the kicker's side owns the ball
/// outright, so the impulse resolves before anyone argues (~200 ms).
pub const KICK_GRACE_TICKS: u64 = 12;
/// Consecutive ticks each discrete event is retransmitted.
pub const EVENT_RESEND_TICKS: u32 = 3;

pub const MATCH_DURATION_TICKS: u32 = 120 * TICK_RATE;
pub const WIN_SCORE: u8 = 5;

pub const POWERUP_INTERVAL_TICKS: u64 = 15 * TICK_RATE as u64;
pub const POWERUP_EFFECT_TICKS: u64 = 8 * TICK_RATE as u64;
pub const PICKUP_RADIUS: f32 = 28.0;
pub const SPEED_BOOST_FACTOR: f32 = 1.5;
pub const POWER_KICK_FACTOR: f32 = 1.6;
