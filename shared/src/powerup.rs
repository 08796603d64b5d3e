//! Deterministic power-up spawning and timed effects.
//!
//! Both peers seed the spawner from the relay-provided match seed and
//! advance it by tick count alone, so the spawn schedule and positions
//! are identical on each side without any replication. Only collection
//! is replicated; the spawn index makes collection first-wins when both
//! peers grab the same item before hearing from each other.

use crate::entity::Side;
use crate::math::Vec2;
use crate::wire::PowerUpKind;
use crate::{
    PITCH_HEIGHT, PITCH_WIDTH, POWERUP_EFFECT_TICKS, POWERUP_INTERVAL_TICKS, POWER_KICK_FACTOR,
    SPEED_BOOST_FACTOR,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnedItem {
    pub item: u32,
    pub kind: PowerUpKind,
    pub position: Vec2,
}

#[derive(Debug, Clone, Copy)]
struct Effect {
    side: Side,
    kind: PowerUpKind,
    expires_at: u64,
}

pub struct PowerUps {
    rng: StdRng,
    next_item: u32,
    active: Option<SpawnedItem>,
    collected: HashSet<u32>,
    effects: Vec<Effect>,
}

impl PowerUps {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_item: 0,
            active: None,
            collected: HashSet::new(),
            effects: Vec::new(),
        }
    }

    /// Advances the spawn schedule to the given tick. Item n appears at
    /// tick (n+1) * POWERUP_INTERVAL_TICKS, replacing any uncollected
    /// predecessor; the rng is consumed once per item in fixed order on
    /// both peers.
    pub fn advance(&mut self, tick: u64) {
        while u64::from(self.next_item + 1) * POWERUP_INTERVAL_TICKS <= tick {
            let kind = if self.rng.gen_bool(0.5) {
                PowerUpKind::SpeedBoost
            } else {
                PowerUpKind::PowerKick
            };
            let position = Vec2::new(
                self.rng.gen_range(PITCH_WIDTH * 0.2..PITCH_WIDTH * 0.8),
                self.rng.gen_range(PITCH_HEIGHT * 0.2..PITCH_HEIGHT * 0.8),
            );
            let item = self.next_item;
            self.next_item += 1;

            if !self.collected.contains(&item) {
                self.active = Some(SpawnedItem {
                    item,
                    kind,
                    position,
                });
            }
        }

        self.effects.retain(|effect| effect.expires_at > tick);
    }

    pub fn active_item(&self) -> Option<SpawnedItem> {
        self.active
    }

    /// Applies a collection (local or replicated). First collection of an
    /// item wins; repeats and late arrivals for the same item are no-ops.
    /// Returns true if the effect was applied.
    pub fn collect(&mut self, item: u32, kind: PowerUpKind, side: Side, tick: u64) -> bool {
        if !self.collected.insert(item) {
            return false;
        }
        if self.active.map(|active| active.item) == Some(item) {
            self.active = None;
        }
        self.effects.push(Effect {
            side,
            kind,
            expires_at: tick + POWERUP_EFFECT_TICKS,
        });
        true
    }

    fn has_effect(&self, side: Side, kind: PowerUpKind, tick: u64) -> bool {
        self.effects
            .iter()
            .any(|e| e.side == side && e.kind == kind && e.expires_at > tick)
    }

    pub fn speed_factor(&self, side: Side, tick: u64) -> f32 {
        if self.has_effect(side, PowerUpKind::SpeedBoost, tick) {
            SPEED_BOOST_FACTOR
        } else {
            1.0
        }
    }

    pub fn kick_factor(&self, side: Side, tick: u64) -> f32 {
        if self.has_effect(side, PowerUpKind::PowerKick, tick) {
            POWER_KICK_FACTOR
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_is_deterministic_for_same_seed() {
        let mut a = PowerUps::new(42);
        let mut b = PowerUps::new(42);

        for tick in 0..POWERUP_INTERVAL_TICKS * 3 + 1 {
            a.advance(tick);
            b.advance(tick);
            assert_eq!(a.active_item(), b.active_item());
        }
        assert!(a.active_item().is_some());
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = PowerUps::new(1);
        let mut b = PowerUps::new(2);

        a.advance(POWERUP_INTERVAL_TICKS);
        b.advance(POWERUP_INTERVAL_TICKS);

        let (item_a, item_b) = (a.active_item().unwrap(), b.active_item().unwrap());
        assert!(item_a.position != item_b.position || item_a.kind != item_b.kind);
    }

    #[test]
    fn test_collection_is_first_wins() {
        let mut powerups = PowerUps::new(7);
        powerups.advance(POWERUP_INTERVAL_TICKS);
        let item = powerups.active_item().unwrap();

        assert!(powerups.collect(item.item, item.kind, Side::Home, POWERUP_INTERVAL_TICKS));
        // The race loser's replicated collection of the same item is a no-op.
        assert!(!powerups.collect(item.item, item.kind, Side::Away, POWERUP_INTERVAL_TICKS));

        assert!(powerups.active_item().is_none());
        assert!(powerups.speed_factor(Side::Home, POWERUP_INTERVAL_TICKS + 1) > 1.0
            || powerups.kick_factor(Side::Home, POWERUP_INTERVAL_TICKS + 1) > 1.0);
        assert_eq!(
            powerups.speed_factor(Side::Away, POWERUP_INTERVAL_TICKS + 1),
            1.0
        );
        assert_eq!(
            powerups.kick_factor(Side::Away, POWERUP_INTERVAL_TICKS + 1),
            1.0
        );
    }

    #[test]
    fn test_effect_expires() {
        let mut powerups = PowerUps::new(7);
        let tick = POWERUP_INTERVAL_TICKS;
        powerups.advance(tick);
        let item = powerups.active_item().unwrap();
        powerups.collect(item.item, PowerUpKind::SpeedBoost, Side::Home, tick);

        assert!(powerups.speed_factor(Side::Home, tick + 1) > 1.0);

        let expired = tick + POWERUP_EFFECT_TICKS + 1;
        powerups.advance(expired);
        assert_eq!(powerups.speed_factor(Side::Home, expired), 1.0);
    }
}
