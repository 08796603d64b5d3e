//! Wire protocol: peer-to-peer game messages, the client/relay envelope,
//! and the codec with receive-side validation.
//!
//! Everything on the wire is bincode. Decoding is paranoid where the
//! simulation is concerned: a snapshot with non-finite or absurd
//! position/velocity components is rejected as malformed instead of being
//! applied, so bad bytes can never poison the physics state.

use crate::entity::{EntityId, Side};
use crate::math::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PROTOCOL_VERSION: u32 = 1;

/// Sanity bounds for decoded snapshot fields. Generously larger than the
/// pitch; anything outside is garbage, not gameplay.
pub const MAX_ABS_COORD: f32 = 10_000.0;
pub const MAX_ABS_SPEED: f32 = 10_000.0;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(&'static str),
    #[error("channel closed")]
    ChannelClosed,
}

/// A point-in-time sample of one entity's motion state.
///
/// `sequence` is scoped to the sending peer and strictly increases per
/// entity; receivers discard any snapshot whose sequence is not greater
/// than the last one they applied for that entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entity: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub sequence: u32,
}

impl Snapshot {
    pub fn validate(&self) -> Result<(), WireError> {
        if !self.position.is_finite() {
            return Err(WireError::MalformedSnapshot("non-finite position"));
        }
        if !self.velocity.is_finite() {
            return Err(WireError::MalformedSnapshot("non-finite velocity"));
        }
        if self.position.x.abs() > MAX_ABS_COORD || self.position.y.abs() > MAX_ABS_COORD {
            return Err(WireError::MalformedSnapshot("position out of range"));
        }
        if self.velocity.x.abs() > MAX_ABS_SPEED || self.velocity.y.abs() > MAX_ABS_SPEED {
            return Err(WireError::MalformedSnapshot("velocity out of range"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    SpeedBoost,
    PowerKick,
}

/// Peer-to-peer game traffic.
///
/// `Move` is the continuous stream: resent every tick and never retried,
/// since a lost sample is superseded by the next one. The remaining kinds
/// are discrete events carrying a sender-scoped `event_id`; they are sent
/// redundantly and de-duplicated on receipt for exactly-once application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Move(Snapshot),
    Kick {
        event_id: u64,
        kicker: EntityId,
        ball: Snapshot,
    },
    Goal {
        event_id: u64,
        side: Side,
    },
    PowerUp {
        event_id: u64,
        item: u32,
        entity: EntityId,
        kind: PowerUpKind,
    },
}

impl Message {
    fn validate(&self) -> Result<(), WireError> {
        match self {
            Message::Move(snapshot) => snapshot.validate(),
            Message::Kick { ball, .. } => ball.validate(),
            Message::Goal { .. } | Message::PowerUp { .. } => Ok(()),
        }
    }
}

pub fn encode_message(message: &Message) -> Result<Vec<u8>, WireError> {
    bincode::serialize(message).map_err(|_| WireError::MalformedSnapshot("encode failed"))
}

/// Decodes and validates one peer message. Truncated or corrupt payloads
/// and snapshots with non-finite fields are rejected.
pub fn decode_message(data: &[u8]) -> Result<Message, WireError> {
    let message: Message = bincode::deserialize(data)
        .map_err(|_| WireError::MalformedSnapshot("undecodable payload"))?;
    message.validate()?;
    Ok(message)
}

/// Client/relay control traffic. The relay never looks inside `Forward`
/// payloads; they are opaque peer bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Envelope {
    Join { client_version: u32 },
    Joined { side: Side },
    MatchStart { seed: u64 },
    Forward { data: Vec<u8> },
    KeepAlive,
    Leave,
    PeerLeft,
}

pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, WireError> {
    bincode::serialize(envelope).map_err(|_| WireError::MalformedSnapshot("encode failed"))
}

pub fn decode_envelope(data: &[u8]) -> Result<Envelope, WireError> {
    bincode::deserialize(data).map_err(|_| WireError::MalformedSnapshot("undecodable payload"))
}
