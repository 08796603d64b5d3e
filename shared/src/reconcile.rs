//! Blending remote authoritative state into the locally-advancing
//! simulation.
//!
//! Each peer runs its own physics every tick, so the remote view of an
//! entity always disagrees slightly with the stream of snapshots arriving
//! for it. Applying received positions verbatim makes entities stutter;
//! ignoring them lets the simulations drift apart. The reconciler holds a
//! per-entity correction target and closes the gap a fraction per tick,
//! snapping only when the error is too large to hide (reconnect, burst
//! loss), so corrections stay invisible while long-term drift converges
//! to zero.

use crate::entity::EntityId;
use crate::math::Vec2;
use crate::physics::PhysicsOracle;
use crate::wire::Snapshot;
use crate::{BLEND_ALPHA, CONVERGE_EPSILON, MAX_SNAP_DISTANCE};
use log::{debug, warn};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct ReconcileConfig {
    /// Largest position error corrected by blending; beyond it the entity
    /// snaps to the remote state outright.
    pub max_snap_distance: f32,
    /// Fraction of the remaining error closed per tick.
    pub alpha: f32,
    /// Error below which the correction finishes with an exact snap.
    pub converge_epsilon: f32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_snap_distance: MAX_SNAP_DISTANCE,
            alpha: BLEND_ALPHA,
            converge_epsilon: CONVERGE_EPSILON,
        }
    }
}

#[derive(Debug, Default)]
struct Track {
    /// Highest snapshot sequence applied for this entity. Snapshots at or
    /// below it are stale and leave all state untouched.
    last_sequence: u32,
    /// Outstanding correction target, cleared once converged.
    target: Option<Vec2>,
}

/// Per-peer reconciliation state for every remote-authoritative entity.
///
/// With exactly one remote peer, tracking per entity is equivalent to the
/// (entity, sender) scoping of snapshot sequences: each side numbers its
/// own outgoing stream, and this struct only ever observes the remote one.
pub struct Reconciler {
    config: ReconcileConfig,
    tracks: HashMap<EntityId, Track>,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            config,
            tracks: HashMap::new(),
        }
    }

    /// Accepts a snapshot for a remote-authoritative entity.
    ///
    /// Fresh snapshots overwrite velocity immediately (blended velocity
    /// reads as stutter) and stage the position as the new correction
    /// target. Returns false for stale or duplicate sequences, which leave
    /// the simulation and the track unchanged.
    pub fn receive(&mut self, snapshot: &Snapshot, physics: &mut dyn PhysicsOracle) -> bool {
        let track = self.tracks.entry(snapshot.entity).or_default();

        if snapshot.sequence <= track.last_sequence {
            debug!(
                "Stale snapshot for entity {} (seq {} <= {})",
                snapshot.entity, snapshot.sequence, track.last_sequence
            );
            return false;
        }

        track.last_sequence = snapshot.sequence;
        track.target = Some(snapshot.position);
        physics.set_velocity(snapshot.entity, snapshot.velocity);
        true
    }

    /// Runs one correction step for every outstanding target.
    ///
    /// Small errors close exponentially (`alpha` of the remainder per
    /// tick, no overshoot); an error beyond `max_snap_distance` is a
    /// desync and snaps instantly, logged as a diagnostic rather than
    /// surfaced as a failure.
    pub fn correct(&mut self, physics: &mut dyn PhysicsOracle) {
        for (&entity, track) in self.tracks.iter_mut() {
            let Some(target) = track.target else {
                continue;
            };
            let Some(position) = physics.position(entity) else {
                track.target = None;
                continue;
            };

            let error = target - position;
            let distance = error.length();

            if distance > self.config.max_snap_distance {
                warn!(
                    "DesyncCorrected: entity {} snapped {:.1} units",
                    entity, distance
                );
                physics.set_position(entity, target);
                track.target = None;
            } else if distance <= self.config.converge_epsilon {
                physics.set_position(entity, target);
                track.target = None;
            } else {
                physics.set_position(entity, position + error * self.config.alpha);
            }
        }
    }

    /// Highest sequence applied for an entity, 0 if never seen.
    pub fn last_applied(&self, entity: EntityId) -> u32 {
        self.tracks
            .get(&entity)
            .map(|track| track.last_sequence)
            .unwrap_or(0)
    }

    /// Records a sequence observed out-of-band (a kick event's embedded
    /// ball snapshot) so older queued snapshots cannot roll it back.
    pub fn observe_sequence(&mut self, entity: EntityId, sequence: u32) {
        let track = self.tracks.entry(entity).or_default();
        track.last_sequence = track.last_sequence.max(sequence);
    }

    /// Drops any outstanding correction for the entity, keeping its
    /// sequence history. Used when authority over it moves to this peer.
    pub fn forget_target(&mut self, entity: EntityId) {
        if let Some(track) = self.tracks.get_mut(&entity) {
            track.target = None;
        }
    }

    /// Drops all outstanding corrections (kickoff reset: both peers place
    /// bodies deterministically, leftover targets would drag them back).
    pub fn clear_targets(&mut self) {
        for track in self.tracks.values_mut() {
            track.target = None;
        }
    }
}
