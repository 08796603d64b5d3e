//! Per-match state and the ordered tick pipeline.
//!
//! The session owns everything mutable about one match: phase, score,
//! clock, authority assignment, reconciliation and event-replication
//! state. Nothing here is ambient; the client creates a session when a
//! match starts and drops it on teardown.
//!
//! Every tick runs the same fixed pipeline: apply local authority, drain
//! the network queue, reconcile remote entities, step physics, detect
//! discrete events, emit outgoing traffic, advance the clock. Incoming
//! messages are only ever looked at inside the drain stage, so a tick's
//! physics step is deterministic within itself.

use crate::ai::AiController;
use crate::entity::{side_of, ControllerRole, EntityId, Side, BALL_ID};
use crate::events::EventReplicator;
use crate::math::Vec2;
use crate::physics::{ball_kickoff_position, kickoff_position, BodyKind, Contact, PhysicsOracle};
use crate::powerup::PowerUps;
use crate::reconcile::{ReconcileConfig, Reconciler};
use crate::wire::{Message, PowerUpKind, Snapshot};
use crate::{
    EVENT_RESEND_TICKS, KICK_GRACE_TICKS, KICK_RANGE, KICK_SPEED, MATCH_DURATION_TICKS,
    PICKUP_RADIUS, PLAYER_SPEED, TEAM_SIZE, TICK_DT, WIN_SCORE,
};
use log::{debug, info, warn};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    pub duration_ticks: u32,
    pub win_score: u8,
    pub team_size: usize,
    pub reconcile: ReconcileConfig,
    pub event_resend_ticks: u32,
    /// End the match with a `PeerDisconnected` outcome when the peer
    /// goes away; otherwise remote entities freeze in place.
    pub end_on_disconnect: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            duration_ticks: MATCH_DURATION_TICKS,
            win_score: WIN_SCORE,
            team_size: TEAM_SIZE,
            reconcile: ReconcileConfig::default(),
            event_resend_ticks: EVENT_RESEND_TICKS,
            end_on_disconnect: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    WaitingForPeer,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Winner(Side),
    Draw,
    PeerDisconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub home: u8,
    pub away: u8,
}

impl Score {
    pub fn of(&self, side: Side) -> u8 {
        match side {
            Side::Home => self.home,
            Side::Away => self.away,
        }
    }

    fn add_one(&mut self, side: Side) {
        match side {
            Side::Home => self.home = self.home.saturating_add(1),
            Side::Away => self.away = self.away.saturating_add(1),
        }
    }
}

/// One tick's worth of player intent: a steering direction and an
/// edge-triggered kick.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerCommand {
    pub direction: Vec2,
    pub kick: bool,
}

impl PlayerCommand {
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Externally-observable side effects of a tick, for the HUD and audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice {
    GoalScored(Side),
    BallKicked(Side),
    PowerUpCollected { side: Side, kind: PowerUpKind },
    MatchEnded(MatchOutcome),
}

#[derive(Debug, Default)]
pub struct TickOutput {
    pub outgoing: Vec<Message>,
    pub notices: Vec<Notice>,
}

pub struct Session {
    config: MatchConfig,
    pub local_side: Side,
    pub phase: MatchPhase,
    pub score: Score,
    pub tick: u64,
    pub ticks_remaining: u32,
    pub outcome: Option<MatchOutcome>,
    peer_connected: bool,
    /// Which side's simulation currently owns the ball. Changes only
    /// through replicated kick events and goal resets, so both peers
    /// agree on it up to message latency.
    ball_authority: Side,
    grace_until: u64,
    reconciler: Reconciler,
    replicator: EventReplicator,
    sequences: HashMap<EntityId, u32>,
    ai: Vec<AiController>,
    powerups: Option<PowerUps>,
}

impl Session {
    pub fn new(local_side: Side, config: MatchConfig) -> Self {
        Self {
            config,
            local_side,
            phase: MatchPhase::WaitingForPeer,
            score: Score::default(),
            tick: 0,
            ticks_remaining: config.duration_ticks,
            outcome: None,
            peer_connected: false,
            ball_authority: Side::Home,
            grace_until: 0,
            reconciler: Reconciler::new(config.reconcile),
            replicator: EventReplicator::new(config.event_resend_ticks),
            sequences: HashMap::new(),
            ai: Vec::new(),
            powerups: None,
        }
    }

    /// Transitions to `Active` once both peers are present: spawns all
    /// bodies at kickoff, seeds the power-up schedule from the shared
    /// match seed, and starts the clock.
    pub fn start(&mut self, seed: u64, physics: &mut dyn PhysicsOracle) {
        if self.phase != MatchPhase::WaitingForPeer {
            warn!("Ignoring match start in phase {:?}", self.phase);
            return;
        }

        physics.create_body(BALL_ID, BodyKind::Ball, ball_kickoff_position());
        for side in [Side::Home, Side::Away] {
            for slot in 0..self.config.team_size {
                physics.create_body(
                    side.player_id(slot),
                    BodyKind::Player,
                    kickoff_position(side, slot),
                );
            }
        }

        self.ai = (1..self.config.team_size)
            .map(|slot| AiController::new(self.local_side.player_id(slot)))
            .collect();
        self.powerups = Some(PowerUps::new(seed));
        self.peer_connected = true;
        self.phase = MatchPhase::Active;
        self.ticks_remaining = self.config.duration_ticks;

        info!("Match started as {:?} (seed {})", self.local_side, seed);
    }

    /// Authority assignment for the current tick.
    pub fn role_of(&self, entity: EntityId) -> ControllerRole {
        let owning_side = if entity == BALL_ID {
            self.ball_authority
        } else {
            match side_of(entity) {
                Some(side) => side,
                None => return ControllerRole::SimulatedLocally,
            }
        };

        if owning_side == self.local_side {
            ControllerRole::LocalAuthoritative
        } else if self.peer_connected {
            ControllerRole::RemoteAuthoritative
        } else {
            ControllerRole::SimulatedLocally
        }
    }

    pub fn seconds_remaining(&self) -> u32 {
        (self.ticks_remaining as f32 * TICK_DT).ceil() as u32
    }

    pub fn ball_authority(&self) -> Side {
        self.ball_authority
    }

    /// Currently spawned, uncollected power-up, for the HUD.
    pub fn active_powerup(&self) -> Option<crate::powerup::SpawnedItem> {
        self.powerups.as_ref().and_then(|p| p.active_item())
    }

    /// Advances the match by one fixed tick. `incoming` is everything the
    /// channel delivered since the previous tick; it is consumed entirely
    /// here and never mid-pipeline.
    pub fn tick(
        &mut self,
        local: PlayerCommand,
        incoming: Vec<Message>,
        physics: &mut dyn PhysicsOracle,
    ) -> TickOutput {
        let mut out = TickOutput::default();
        if self.phase != MatchPhase::Active {
            // Sealed for application: incoming is discarded, no snapshots
            // go out. Discrete events queued before the end still finish
            // their redundant sends so the peer hears the final goal.
            if self.phase == MatchPhase::Ended {
                out.outgoing = self.replicator.drain_sends();
            }
            return out;
        }
        self.tick += 1;

        let kick_intents = self.apply_local_authority(local, physics);

        for message in incoming {
            self.apply_message(message, physics, &mut out.notices);
        }

        if self.phase == MatchPhase::Active {
            self.reconciler.correct(physics);

            let contacts = physics.step(TICK_DT);

            for kicker in kick_intents {
                self.try_kick(kicker, physics, &mut out);
            }
            self.detect_goals(&contacts, physics, &mut out);
            self.collect_powerups(physics, &mut out);
        }

        if self.phase == MatchPhase::Active {
            self.emit_snapshots(physics, &mut out);
        }
        out.outgoing.extend(self.replicator.drain_sends());

        if self.phase == MatchPhase::Active {
            self.advance_clock(&mut out);
        }

        out
    }

    /// Peer went away: freeze its entities or end the match, per config.
    pub fn peer_left(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        self.peer_connected = false;

        if self.phase == MatchPhase::Active {
            warn!("Peer disconnected mid-match");
            if self.config.end_on_disconnect {
                self.finish(MatchOutcome::PeerDisconnected, &mut notices);
            }
        }
        notices
    }

    fn apply_local_authority(
        &mut self,
        local: PlayerCommand,
        physics: &mut dyn PhysicsOracle,
    ) -> Vec<EntityId> {
        let mut kick_intents = Vec::new();
        let speed = PLAYER_SPEED * self.speed_factor(self.local_side);

        let human = self.local_side.human_id();
        physics.set_velocity(human, local.direction.normalized() * speed);
        if local.kick {
            kick_intents.push(human);
        }

        let side = self.local_side;
        let commands: Vec<(EntityId, PlayerCommand)> = self
            .ai
            .iter_mut()
            .map(|controller| (controller.entity, controller.decide(side, physics)))
            .collect();
        for (entity, command) in commands {
            physics.set_velocity(entity, command.direction * speed);
            if command.kick {
                kick_intents.push(entity);
            }
        }

        if !self.peer_connected {
            for entity in self.local_side.opponent().team_ids(self.config.team_size) {
                physics.set_velocity(entity, Vec2::ZERO);
            }
        }

        kick_intents
    }

    fn apply_message(
        &mut self,
        message: Message,
        physics: &mut dyn PhysicsOracle,
        notices: &mut Vec<Notice>,
    ) {
        match message {
            Message::Move(snapshot) => match self.role_of(snapshot.entity) {
                ControllerRole::RemoteAuthoritative => {
                    self.reconciler.receive(&snapshot, physics);
                }
                ControllerRole::LocalAuthoritative => {
                    debug!(
                        "Dropping remote snapshot for locally-authoritative entity {}",
                        snapshot.entity
                    );
                }
                ControllerRole::SimulatedLocally => {}
            },
            Message::Kick {
                event_id,
                kicker,
                ball,
            } => {
                if !self.replicator.accept_remote(event_id) {
                    return;
                }
                let Some(kicker_side) = side_of(kicker) else {
                    warn!("Kick event with non-player kicker {}", kicker);
                    return;
                };

                // Crossed kicks: if both peers kicked inside the grace
                // window, the home side's kick wins on both peers.
                let contested =
                    self.tick < self.grace_until && self.ball_authority == self.local_side;
                if contested && self.local_side == Side::Home {
                    debug!("Crossed kick from {:?} ignored (home wins tie)", kicker_side);
                    return;
                }

                physics.set_position(BALL_ID, ball.position);
                physics.set_velocity(BALL_ID, ball.velocity);
                self.reconciler.observe_sequence(BALL_ID, ball.sequence);
                self.reconciler.forget_target(BALL_ID);
                self.ball_authority = kicker_side;
                self.grace_until = self.tick + KICK_GRACE_TICKS;
                notices.push(Notice::BallKicked(kicker_side));
            }
            Message::Goal { event_id, side } => {
                if self.replicator.accept_remote(event_id) {
                    self.apply_goal(side, physics, notices);
                }
            }
            Message::PowerUp {
                event_id,
                item,
                entity,
                kind,
            } => {
                if !self.replicator.accept_remote(event_id) {
                    return;
                }
                let side = side_of(entity).unwrap_or_else(|| self.local_side.opponent());
                let tick = self.tick;
                if let Some(powerups) = &mut self.powerups {
                    if powerups.collect(item, kind, side, tick) {
                        notices.push(Notice::PowerUpCollected { side, kind });
                    }
                }
            }
        }
    }

    fn try_kick(&mut self, kicker: EntityId, physics: &mut dyn PhysicsOracle, out: &mut TickOutput) {
        let (Some(kicker_position), Some(ball_position)) =
            (physics.position(kicker), physics.position(BALL_ID))
        else {
            return;
        };
        if kicker_position.distance(ball_position) > KICK_RANGE {
            return;
        }

        let direction = (ball_position - kicker_position).normalized();
        let direction = if direction == Vec2::ZERO {
            // Kicker standing on the ball; send it toward the far goal.
            match self.local_side {
                Side::Home => Vec2::new(1.0, 0.0),
                Side::Away => Vec2::new(-1.0, 0.0),
            }
        } else {
            direction
        };

        let speed = KICK_SPEED * self.kick_factor(self.local_side);
        physics.set_velocity(BALL_ID, direction * speed);

        self.ball_authority = self.local_side;
        self.grace_until = self.tick + KICK_GRACE_TICKS;
        self.reconciler.forget_target(BALL_ID);

        let sequence = self.next_sequence(BALL_ID);
        let ball = Snapshot {
            entity: BALL_ID,
            position: physics.position(BALL_ID).unwrap_or(ball_position),
            velocity: physics.velocity(BALL_ID).unwrap_or(Vec2::ZERO),
            sequence,
        };
        let event_id = self.replicator.next_id();
        self.replicator.queue(Message::Kick {
            event_id,
            kicker,
            ball,
        });
        out.notices.push(Notice::BallKicked(self.local_side));
    }

    fn detect_goals(
        &mut self,
        contacts: &[Contact],
        physics: &mut dyn PhysicsOracle,
        out: &mut TickOutput,
    ) {
        for contact in contacts {
            let Contact::BallInGoal(defending_side) = *contact;

            // Only the ball-authority side rules on goals; the other peer
            // hears about it through the replicated event. One referee,
            // no double counting.
            if self.role_of(BALL_ID) != ControllerRole::LocalAuthoritative {
                continue;
            }

            let scoring_side = defending_side.opponent();
            let event_id = self.replicator.next_id();
            self.replicator.queue(Message::Goal {
                event_id,
                side: scoring_side,
            });
            self.apply_goal(scoring_side, physics, &mut out.notices);
            if self.phase != MatchPhase::Active {
                return;
            }
        }
    }

    fn apply_goal(
        &mut self,
        scoring_side: Side,
        physics: &mut dyn PhysicsOracle,
        notices: &mut Vec<Notice>,
    ) {
        self.score.add_one(scoring_side);
        info!(
            "Goal for {:?} ({}-{})",
            scoring_side, self.score.home, self.score.away
        );
        notices.push(Notice::GoalScored(scoring_side));

        self.reset_kickoff(physics);
        // Conceding side restarts play and takes the ball.
        self.ball_authority = scoring_side.opponent();

        if self.score.of(scoring_side) >= self.config.win_score {
            self.finish(MatchOutcome::Winner(scoring_side), notices);
        }
    }

    fn reset_kickoff(&mut self, physics: &mut dyn PhysicsOracle) {
        physics.set_position(BALL_ID, ball_kickoff_position());
        physics.set_velocity(BALL_ID, Vec2::ZERO);
        for side in [Side::Home, Side::Away] {
            for slot in 0..self.config.team_size {
                let entity = side.player_id(slot);
                physics.set_position(entity, kickoff_position(side, slot));
                physics.set_velocity(entity, Vec2::ZERO);
            }
        }
        self.reconciler.clear_targets();
        self.grace_until = 0;
    }

    fn collect_powerups(&mut self, physics: &mut dyn PhysicsOracle, out: &mut TickOutput) {
        let tick = self.tick;
        let Some(powerups) = &mut self.powerups else {
            return;
        };
        powerups.advance(tick);

        let Some(item) = powerups.active_item() else {
            return;
        };

        for entity in self.local_side.team_ids(self.config.team_size) {
            let Some(position) = physics.position(entity) else {
                continue;
            };
            if position.distance(item.position) > PICKUP_RADIUS {
                continue;
            }

            if powerups.collect(item.item, item.kind, self.local_side, tick) {
                let event_id = self.replicator.next_id();
                self.replicator.queue(Message::PowerUp {
                    event_id,
                    item: item.item,
                    entity,
                    kind: item.kind,
                });
                out.notices.push(Notice::PowerUpCollected {
                    side: self.local_side,
                    kind: item.kind,
                });
            }
            break;
        }
    }

    fn emit_snapshots(&mut self, physics: &mut dyn PhysicsOracle, out: &mut TickOutput) {
        let mut entities = self.local_side.team_ids(self.config.team_size);
        if self.role_of(BALL_ID) == ControllerRole::LocalAuthoritative {
            entities.push(BALL_ID);
        }

        for entity in entities {
            let (Some(position), Some(velocity)) =
                (physics.position(entity), physics.velocity(entity))
            else {
                continue;
            };
            let sequence = self.next_sequence(entity);
            out.outgoing.push(Message::Move(Snapshot {
                entity,
                position,
                velocity,
                sequence,
            }));
        }
    }

    fn advance_clock(&mut self, out: &mut TickOutput) {
        self.ticks_remaining = self.ticks_remaining.saturating_sub(1);
        if self.ticks_remaining == 0 {
            let outcome = if self.score.home > self.score.away {
                MatchOutcome::Winner(Side::Home)
            } else if self.score.away > self.score.home {
                MatchOutcome::Winner(Side::Away)
            } else {
                MatchOutcome::Draw
            };
            self.finish(outcome, &mut out.notices);
        }
    }

    fn finish(&mut self, outcome: MatchOutcome, notices: &mut Vec<Notice>) {
        if self.phase == MatchPhase::Ended {
            return;
        }
        self.phase = MatchPhase::Ended;
        self.outcome = Some(outcome);
        notices.push(Notice::MatchEnded(outcome));
        info!("Match ended: {:?}", outcome);
    }

    fn next_sequence(&mut self, entity: EntityId) -> u32 {
        let sequence = self.sequences.entry(entity).or_insert(0);
        *sequence += 1;
        *sequence
    }

    fn speed_factor(&self, side: Side) -> f32 {
        self.powerups
            .as_ref()
            .map(|p| p.speed_factor(side, self.tick))
            .unwrap_or(1.0)
    }

    fn kick_factor(&self, side: Side) -> f32 {
        self.powerups
            .as_ref()
            .map(|p| p.kick_factor(side, self.tick))
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PitchPhysics;

    fn started_session(side: Side) -> (Session, PitchPhysics) {
        let mut physics = PitchPhysics::new();
        let mut session = Session::new(side, MatchConfig::default());
        session.start(1234, &mut physics);
        (session, physics)
    }

    fn remote_kick(event_id: u64, sequence: u32) -> Message {
        Message::Kick {
            event_id,
            kicker: Side::Away.human_id(),
            ball: Snapshot {
                entity: BALL_ID,
                position: Vec2::new(300.0, 200.0),
                velocity: Vec2::new(-400.0, 0.0),
                sequence,
            },
        }
    }

    #[test]
    fn test_start_spawns_everyone() {
        let (session, physics) = started_session(Side::Home);

        assert_eq!(session.phase, MatchPhase::Active);
        assert!(physics.position(BALL_ID).is_some());
        for side in [Side::Home, Side::Away] {
            for slot in 0..TEAM_SIZE {
                assert!(physics.position(side.player_id(slot)).is_some());
            }
        }
    }

    #[test]
    fn test_outgoing_snapshot_sequences_increase() {
        let (mut session, mut physics) = started_session(Side::Home);

        let mut last_human_seq = 0;
        for _ in 0..5 {
            let out = session.tick(PlayerCommand::idle(), Vec::new(), &mut physics);
            let seq = out
                .outgoing
                .iter()
                .find_map(|message| match message {
                    Message::Move(s) if s.entity == Side::Home.human_id() => Some(s.sequence),
                    _ => None,
                })
                .expect("human snapshot every tick");
            assert!(seq > last_human_seq);
            last_human_seq = seq;
        }
    }

    #[test]
    fn test_home_sends_ball_snapshots_initially() {
        let (mut session, mut physics) = started_session(Side::Home);
        let out = session.tick(PlayerCommand::idle(), Vec::new(), &mut physics);

        assert!(out.outgoing.iter().any(|message| matches!(
            message,
            Message::Move(s) if s.entity == BALL_ID
        )));

        let (mut away, mut away_physics) = started_session(Side::Away);
        let out = away.tick(PlayerCommand::idle(), Vec::new(), &mut away_physics);
        assert!(!out.outgoing.iter().any(|message| matches!(
            message,
            Message::Move(s) if s.entity == BALL_ID
        )));
    }

    #[test]
    fn test_duplicate_kick_event_is_noop() {
        let (mut session, mut physics) = started_session(Side::Home);

        session.tick(
            PlayerCommand::idle(),
            vec![remote_kick(7, 1)],
            &mut physics,
        );
        let ball_velocity = physics.velocity(BALL_ID).unwrap();
        let authority = session.ball_authority();
        assert_eq!(authority, Side::Away);

        // Same event id delivered again (network duplicate): nothing moves.
        physics.set_velocity(BALL_ID, Vec2::new(5.0, 5.0));
        session.tick(
            PlayerCommand::idle(),
            vec![remote_kick(7, 1)],
            &mut physics,
        );
        assert_ne!(physics.velocity(BALL_ID).unwrap(), ball_velocity);
        assert_eq!(session.ball_authority(), authority);
        assert_eq!(session.score, Score::default());
    }

    #[test]
    fn test_remote_goal_applies_exactly_once() {
        let (mut session, mut physics) = started_session(Side::Home);

        let goal = Message::Goal {
            event_id: 3,
            side: Side::Away,
        };
        session.tick(PlayerCommand::idle(), vec![goal.clone()], &mut physics);
        assert_eq!(session.score.away, 1);

        // Redelivered under at-least-once semantics.
        session.tick(PlayerCommand::idle(), vec![goal.clone(), goal], &mut physics);
        assert_eq!(session.score.away, 1);
        assert_eq!(session.score.home, 0);
    }

    #[test]
    fn test_goal_resets_kickoff_and_hands_ball_to_conceder() {
        let (mut session, mut physics) = started_session(Side::Home);

        physics.set_position(BALL_ID, Vec2::new(700.0, 100.0));
        session.tick(
            PlayerCommand::idle(),
            vec![Message::Goal {
                event_id: 1,
                side: Side::Away,
            }],
            &mut physics,
        );

        assert_eq!(physics.position(BALL_ID).unwrap(), ball_kickoff_position());
        // Home conceded, home kicks off.
        assert_eq!(session.ball_authority(), Side::Home);
    }

    #[test]
    fn test_win_score_ends_match_and_seals_session() {
        let (mut session, mut physics) = started_session(Side::Home);

        for event_id in 1..=u64::from(WIN_SCORE) {
            session.tick(
                PlayerCommand::idle(),
                vec![Message::Goal {
                    event_id,
                    side: Side::Away,
                }],
                &mut physics,
            );
        }

        assert_eq!(session.phase, MatchPhase::Ended);
        assert_eq!(session.outcome, Some(MatchOutcome::Winner(Side::Away)));

        // Sealed: further events change nothing and nothing is sent.
        let out = session.tick(
            PlayerCommand::idle(),
            vec![Message::Goal {
                event_id: 99,
                side: Side::Away,
            }],
            &mut physics,
        );
        assert_eq!(session.score.away, WIN_SCORE);
        assert!(out.outgoing.is_empty());
        assert!(out.notices.is_empty());
    }

    #[test]
    fn test_timer_expiry_gives_draw() {
        let mut physics = PitchPhysics::new();
        let mut session = Session::new(
            Side::Home,
            MatchConfig {
                duration_ticks: 3,
                ..MatchConfig::default()
            },
        );
        session.start(1, &mut physics);

        for _ in 0..3 {
            session.tick(PlayerCommand::idle(), Vec::new(), &mut physics);
        }

        assert_eq!(session.phase, MatchPhase::Ended);
        assert_eq!(session.outcome, Some(MatchOutcome::Draw));
    }

    #[test]
    fn test_remote_snapshot_for_local_entity_is_ignored() {
        let (mut session, mut physics) = started_session(Side::Home);
        let human = Side::Home.human_id();
        let before = physics.position(human).unwrap();

        session.tick(
            PlayerCommand::idle(),
            vec![Message::Move(Snapshot {
                entity: human,
                position: Vec2::new(600.0, 400.0),
                velocity: Vec2::ZERO,
                sequence: 50,
            })],
            &mut physics,
        );

        // Still at (or drifting from) kickoff, not teleported.
        assert!(physics.position(human).unwrap().distance(before) < 10.0);
    }

    #[test]
    fn test_remote_ball_snapshot_ignored_while_local_holds_authority() {
        let (mut session, mut physics) = started_session(Side::Home);
        assert_eq!(session.ball_authority(), Side::Home);
        let before = physics.position(BALL_ID).unwrap();

        session.tick(
            PlayerCommand::idle(),
            vec![Message::Move(Snapshot {
                entity: BALL_ID,
                position: Vec2::new(50.0, 50.0),
                velocity: Vec2::ZERO,
                sequence: 9,
            })],
            &mut physics,
        );

        assert!(physics.position(BALL_ID).unwrap().distance(before) < 5.0);
    }

    #[test]
    fn test_peer_left_ends_match_by_default() {
        let (mut session, mut _physics) = started_session(Side::Home);

        let notices = session.peer_left();

        assert_eq!(session.phase, MatchPhase::Ended);
        assert_eq!(session.outcome, Some(MatchOutcome::PeerDisconnected));
        assert!(notices.contains(&Notice::MatchEnded(MatchOutcome::PeerDisconnected)));
    }

    #[test]
    fn test_peer_left_freeze_mode_keeps_playing() {
        let mut physics = PitchPhysics::new();
        let mut session = Session::new(
            Side::Home,
            MatchConfig {
                end_on_disconnect: false,
                ..MatchConfig::default()
            },
        );
        session.start(1, &mut physics);
        session.peer_left();

        assert_eq!(session.phase, MatchPhase::Active);
        assert_eq!(session.role_of(Side::Away.human_id()), ControllerRole::SimulatedLocally);

        // Remote entities freeze in place.
        physics.set_velocity(Side::Away.human_id(), Vec2::new(100.0, 0.0));
        session.tick(PlayerCommand::idle(), Vec::new(), &mut physics);
        assert_eq!(
            physics.velocity(Side::Away.human_id()).unwrap(),
            Vec2::ZERO
        );
    }

    #[test]
    fn test_local_kick_transfers_authority_and_emits_event() {
        let (mut session, mut physics) = started_session(Side::Away);
        assert_eq!(session.ball_authority(), Side::Home);

        // Put the away human on the ball and kick.
        let human = Side::Away.human_id();
        physics.set_position(human, ball_kickoff_position() + Vec2::new(20.0, 0.0));
        let out = session.tick(
            PlayerCommand {
                direction: Vec2::ZERO,
                kick: true,
            },
            Vec::new(),
            &mut physics,
        );

        assert_eq!(session.ball_authority(), Side::Away);
        assert!(out
            .outgoing
            .iter()
            .any(|message| matches!(message, Message::Kick { .. })));
        assert!(out.notices.contains(&Notice::BallKicked(Side::Away)));
        // Kick pushed the ball away from the kicker (toward lower x).
        assert!(physics.velocity(BALL_ID).unwrap().x < 0.0);
    }
}
