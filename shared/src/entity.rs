//! Entity identity and authority roles.
//!
//! Entity ids are fixed at spawn and identical on both peers: the ball is
//! id 0, home players count up from 1, away players from 101. The first
//! slot of each team is the human-controlled player, the rest are AI
//! teammates simulated by the owning peer.

use serde::{Deserialize, Serialize};

pub type EntityId = u32;

pub const BALL_ID: EntityId = 0;
pub const HOME_BASE_ID: EntityId = 1;
pub const AWAY_BASE_ID: EntityId = 101;

/// One of the two teams in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }

    /// Entity id for the team's player in the given slot. Slot 0 is the
    /// human slot.
    pub fn player_id(self, slot: usize) -> EntityId {
        let base = match self {
            Side::Home => HOME_BASE_ID,
            Side::Away => AWAY_BASE_ID,
        };
        base + slot as EntityId
    }

    pub fn human_id(self) -> EntityId {
        self.player_id(0)
    }

    pub fn team_ids(self, team_size: usize) -> Vec<EntityId> {
        (0..team_size).map(|slot| self.player_id(slot)).collect()
    }
}

/// Which team a player entity belongs to. `None` for the ball.
pub fn side_of(id: EntityId) -> Option<Side> {
    if id == BALL_ID {
        None
    } else if id < AWAY_BASE_ID {
        Some(Side::Home)
    } else {
        Some(Side::Away)
    }
}

/// Who owns an entity's simulated state for the current tick.
///
/// Exactly one authority per entity per tick. The ball's authority
/// transfers between sides on kick events but never splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerRole {
    /// This peer's simulation is ground truth; outgoing snapshots are
    /// produced from it and incoming snapshots for it are ignored.
    LocalAuthoritative,
    /// The remote peer is ground truth; incoming snapshots are blended
    /// into the local simulation.
    RemoteAuthoritative,
    /// Physics-only: advanced locally, neither sent nor reconciled
    /// (remote entities after the peer is gone).
    SimulatedLocally,
}
