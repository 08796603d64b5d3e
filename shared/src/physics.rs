//! The simulation oracle: the trait the sync core drives bodies through,
//! and the reference top-down pitch implementation.
//!
//! The reconciliation engine never assumes anything about integration or
//! collision response beyond this interface; discrete occurrences (the
//! ball crossing a goal line) surface as `Contact` values returned from
//! `step` and are consumed by the session's tick pipeline.

use crate::entity::{EntityId, Side, BALL_ID};
use crate::math::Vec2;
use crate::{
    BALL_FRICTION, BALL_RADIUS, DRIBBLE_PUSH, GOAL_DEPTH, GOAL_MOUTH, PITCH_HEIGHT, PITCH_WIDTH,
    PLAYER_RADIUS, WALL_RESTITUTION,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Player,
    Ball,
}

#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub kind: BodyKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
}

/// A discrete occurrence observed during a physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// The ball crossed the goal line of the named defending side.
    BallInGoal(Side),
}

/// Black-box rigid-body oracle. Advances bodies, answers state queries,
/// accepts authoritative overrides from reconciliation.
pub trait PhysicsOracle {
    fn create_body(&mut self, id: EntityId, kind: BodyKind, position: Vec2);
    fn position(&self, id: EntityId) -> Option<Vec2>;
    fn velocity(&self, id: EntityId) -> Option<Vec2>;
    fn set_position(&mut self, id: EntityId, position: Vec2);
    fn set_velocity(&mut self, id: EntityId, velocity: Vec2);
    fn apply_impulse(&mut self, id: EntityId, impulse: Vec2);
    fn step(&mut self, dt: f32) -> Vec<Contact>;
}

/// Reference oracle: a walled top-down pitch with a goal mouth at each
/// end, circular bodies, ball friction and restitution.
pub struct PitchPhysics {
    bodies: HashMap<EntityId, Body>,
    /// Set while the ball rests in a net; the goal contact is emitted only
    /// on the transition into it.
    ball_in_net: Option<Side>,
}

impl PitchPhysics {
    pub fn new() -> Self {
        Self {
            bodies: HashMap::new(),
            ball_in_net: None,
        }
    }

    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    fn goal_mouth_range() -> (f32, f32) {
        let top = (PITCH_HEIGHT - GOAL_MOUTH) / 2.0;
        (top, top + GOAL_MOUTH)
    }

    fn integrate(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            body.position += body.velocity * dt;

            if body.kind == BodyKind::Ball {
                let damp = (1.0 - BALL_FRICTION * dt).max(0.0);
                body.velocity = body.velocity * damp;
            }
        }
    }

    fn constrain_players(&mut self) {
        for body in self.bodies.values_mut() {
            if body.kind != BodyKind::Player {
                continue;
            }
            body.position.x = body
                .position
                .x
                .clamp(PLAYER_RADIUS, PITCH_WIDTH - PLAYER_RADIUS);
            body.position.y = body
                .position
                .y
                .clamp(PLAYER_RADIUS, PITCH_HEIGHT - PLAYER_RADIUS);
        }
    }

    fn constrain_ball(&mut self, contacts: &mut Vec<Contact>) {
        let Some(ball) = self.bodies.get_mut(&BALL_ID) else {
            return;
        };
        let (mouth_top, mouth_bottom) = Self::goal_mouth_range();

        if ball.position.y < BALL_RADIUS {
            ball.position.y = BALL_RADIUS;
            ball.velocity.y = -ball.velocity.y * WALL_RESTITUTION;
        } else if ball.position.y > PITCH_HEIGHT - BALL_RADIUS {
            ball.position.y = PITCH_HEIGHT - BALL_RADIUS;
            ball.velocity.y = -ball.velocity.y * WALL_RESTITUTION;
        }

        let in_mouth = ball.position.y >= mouth_top && ball.position.y <= mouth_bottom;

        if ball.position.x < 0.0 && in_mouth {
            // Crossed the home goal line; settle in the net.
            ball.position.x = ball.position.x.max(-GOAL_DEPTH + BALL_RADIUS);
            ball.velocity = Vec2::ZERO;
            if self.ball_in_net.is_none() {
                self.ball_in_net = Some(Side::Home);
                contacts.push(Contact::BallInGoal(Side::Home));
            }
        } else if ball.position.x > PITCH_WIDTH && in_mouth {
            ball.position.x = ball.position.x.min(PITCH_WIDTH + GOAL_DEPTH - BALL_RADIUS);
            ball.velocity = Vec2::ZERO;
            if self.ball_in_net.is_none() {
                self.ball_in_net = Some(Side::Away);
                contacts.push(Contact::BallInGoal(Side::Away));
            }
        } else if !in_mouth {
            if ball.position.x < BALL_RADIUS {
                ball.position.x = BALL_RADIUS;
                ball.velocity.x = -ball.velocity.x * WALL_RESTITUTION;
            } else if ball.position.x > PITCH_WIDTH - BALL_RADIUS {
                ball.position.x = PITCH_WIDTH - BALL_RADIUS;
                ball.velocity.x = -ball.velocity.x * WALL_RESTITUTION;
            }
        }
    }

    fn resolve_overlaps(&mut self) {
        let ids: Vec<EntityId> = self.bodies.keys().copied().collect();

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let (a, b) = (ids[i], ids[j]);
                let (Some(body_a), Some(body_b)) = (self.bodies.get(&a), self.bodies.get(&b))
                else {
                    continue;
                };

                let delta = body_b.position - body_a.position;
                let min_dist = body_a.radius + body_b.radius;
                let dist = delta.length();
                if dist >= min_dist {
                    continue;
                }

                // Degenerate exact overlap: separate along x.
                let normal = if dist < 0.001 {
                    Vec2::new(1.0, 0.0)
                } else {
                    delta * (1.0 / dist)
                };
                let overlap = min_dist - dist.max(0.001);

                let a_kind = body_a.kind;
                let b_kind = body_b.kind;

                match (a_kind, b_kind) {
                    (BodyKind::Player, BodyKind::Player) => {
                        let half = overlap / 2.0;
                        if let Some(body) = self.bodies.get_mut(&a) {
                            body.position += -normal * half;
                        }
                        if let Some(body) = self.bodies.get_mut(&b) {
                            body.position += normal * half;
                        }
                    }
                    // Ball yields fully to the player and inherits a push.
                    (BodyKind::Player, BodyKind::Ball) => {
                        let push = self.bodies.get(&a).map(|p| p.velocity).unwrap_or(Vec2::ZERO);
                        if let Some(ball) = self.bodies.get_mut(&b) {
                            ball.position += normal * overlap;
                            ball.velocity = push + normal * DRIBBLE_PUSH;
                        }
                    }
                    (BodyKind::Ball, BodyKind::Player) => {
                        let push = self.bodies.get(&b).map(|p| p.velocity).unwrap_or(Vec2::ZERO);
                        if let Some(ball) = self.bodies.get_mut(&a) {
                            ball.position += -normal * overlap;
                            ball.velocity = push + -normal * DRIBBLE_PUSH;
                        }
                    }
                    (BodyKind::Ball, BodyKind::Ball) => {}
                }
            }
        }
    }
}

impl Default for PitchPhysics {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsOracle for PitchPhysics {
    fn create_body(&mut self, id: EntityId, kind: BodyKind, position: Vec2) {
        let radius = match kind {
            BodyKind::Player => PLAYER_RADIUS,
            BodyKind::Ball => BALL_RADIUS,
        };
        self.bodies.insert(
            id,
            Body {
                kind,
                position,
                velocity: Vec2::ZERO,
                radius,
            },
        );
    }

    fn position(&self, id: EntityId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.position)
    }

    fn velocity(&self, id: EntityId) -> Option<Vec2> {
        self.bodies.get(&id).map(|b| b.velocity)
    }

    fn set_position(&mut self, id: EntityId, position: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.position = position;
        }
        if id == BALL_ID {
            self.ball_in_net = None;
        }
    }

    fn set_velocity(&mut self, id: EntityId, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity = velocity;
        }
    }

    fn apply_impulse(&mut self, id: EntityId, impulse: Vec2) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.velocity += impulse;
        }
    }

    fn step(&mut self, dt: f32) -> Vec<Contact> {
        let mut contacts = Vec::new();

        self.integrate(dt);
        self.resolve_overlaps();
        self.constrain_players();
        self.constrain_ball(&mut contacts);

        contacts
    }
}

/// Kickoff spot for the given team slot. Slot 0 (the human) starts
/// forward of the AI teammates.
pub fn kickoff_position(side: Side, slot: usize) -> Vec2 {
    const LANES: [f32; 5] = [0.5, 0.25, 0.75, 0.35, 0.65];

    let depth = if slot == 0 { 0.30 } else { 0.15 };
    let x = match side {
        Side::Home => PITCH_WIDTH * depth,
        Side::Away => PITCH_WIDTH * (1.0 - depth),
    };
    let y = PITCH_HEIGHT * LANES[slot.min(LANES.len() - 1)];

    Vec2::new(x, y)
}

pub fn ball_kickoff_position() -> Vec2 {
    Vec2::new(PITCH_WIDTH / 2.0, PITCH_HEIGHT / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn pitch_with_ball(position: Vec2, velocity: Vec2) -> PitchPhysics {
        let mut physics = PitchPhysics::new();
        physics.create_body(BALL_ID, BodyKind::Ball, position);
        physics.set_velocity(BALL_ID, velocity);
        physics
    }

    #[test]
    fn test_ball_friction_slows_ball() {
        let mut physics = pitch_with_ball(ball_kickoff_position(), Vec2::new(200.0, 0.0));

        for _ in 0..30 {
            physics.step(1.0 / 60.0);
        }

        let speed = physics.velocity(BALL_ID).unwrap().length();
        assert!(speed < 200.0);
        assert!(speed > 0.0);
    }

    #[test]
    fn test_ball_bounces_off_side_wall() {
        let mut physics = pitch_with_ball(Vec2::new(400.0, 12.0), Vec2::new(0.0, -300.0));

        physics.step(1.0 / 60.0);

        let ball = physics.body(BALL_ID).unwrap();
        assert!(ball.velocity.y > 0.0);
        assert_approx_eq!(ball.position.y, BALL_RADIUS, 0.001);
    }

    #[test]
    fn test_goal_contact_fires_once() {
        let mut physics = pitch_with_ball(
            Vec2::new(6.0, PITCH_HEIGHT / 2.0),
            Vec2::new(-600.0, 0.0),
        );

        let mut goals = 0;
        for _ in 0..20 {
            for contact in physics.step(1.0 / 60.0) {
                let Contact::BallInGoal(side) = contact;
                assert_eq!(side, Side::Home);
                goals += 1;
            }
        }

        assert_eq!(goals, 1);
    }

    #[test]
    fn test_goal_state_cleared_on_reset() {
        let mut physics = pitch_with_ball(
            Vec2::new(6.0, PITCH_HEIGHT / 2.0),
            Vec2::new(-600.0, 0.0),
        );

        let mut goals = 0;
        for _ in 0..10 {
            goals += physics.step(1.0 / 60.0).len();
        }
        assert_eq!(goals, 1);

        // Kickoff reset re-arms the sensor.
        physics.set_position(BALL_ID, ball_kickoff_position());
        physics.set_velocity(BALL_ID, Vec2::new(-600.0, 0.0));

        let mut more_goals = 0;
        for _ in 0..180 {
            more_goals += physics.step(1.0 / 60.0).len();
        }
        assert_eq!(more_goals, 1);
    }

    #[test]
    fn test_ball_outside_mouth_bounces_off_end_wall() {
        let mut physics = pitch_with_ball(Vec2::new(12.0, 30.0), Vec2::new(-400.0, 0.0));

        let contacts = physics.step(1.0 / 60.0);
        assert!(contacts.is_empty());
        assert!(physics.velocity(BALL_ID).unwrap().x > 0.0);
    }

    #[test]
    fn test_player_clamped_to_pitch() {
        let mut physics = PitchPhysics::new();
        physics.create_body(1, BodyKind::Player, Vec2::new(20.0, 20.0));
        physics.set_velocity(1, Vec2::new(-500.0, -500.0));

        for _ in 0..10 {
            physics.step(1.0 / 60.0);
        }

        let position = physics.position(1).unwrap();
        assert_approx_eq!(position.x, PLAYER_RADIUS, 0.001);
        assert_approx_eq!(position.y, PLAYER_RADIUS, 0.001);
    }

    #[test]
    fn test_player_pushes_ball_out_of_overlap() {
        let mut physics = PitchPhysics::new();
        physics.create_body(1, BodyKind::Player, Vec2::new(400.0, 250.0));
        physics.create_body(BALL_ID, BodyKind::Ball, Vec2::new(410.0, 250.0));
        physics.set_velocity(1, Vec2::new(100.0, 0.0));

        physics.step(1.0 / 60.0);

        let player = physics.position(1).unwrap();
        let ball = physics.position(BALL_ID).unwrap();
        assert!(player.distance(ball) >= PLAYER_RADIUS + BALL_RADIUS - 0.01);
        assert!(physics.velocity(BALL_ID).unwrap().x > 0.0);
    }

    #[test]
    fn test_kickoff_positions_inside_pitch() {
        for side in [Side::Home, Side::Away] {
            for slot in 0..4 {
                let position = kickoff_position(side, slot);
                assert!(position.x > 0.0 && position.x < PITCH_WIDTH);
                assert!(position.y > 0.0 && position.y < PITCH_HEIGHT);
            }
        }
    }
}
