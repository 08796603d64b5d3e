//! Steering for AI teammates. Each peer runs the AI for its own side
//! only; the opponent's AI players arrive as ordinary remote snapshots.

use crate::entity::{EntityId, Side, BALL_ID};
use crate::math::Vec2;
use crate::physics::PhysicsOracle;
use crate::session::PlayerCommand;
use crate::KICK_RANGE;

const KICK_COOLDOWN_TICKS: u32 = 30;
const APPROACH_DISTANCE: f32 = 4.0;

pub struct AiController {
    pub entity: EntityId,
    kick_cooldown: u32,
}

impl AiController {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            kick_cooldown: 0,
        }
    }

    /// One steering decision per tick: chase the ball, staying goal-side
    /// of it so a kick pushes toward the opponent, and kick on reach.
    pub fn decide(&mut self, side: Side, physics: &dyn PhysicsOracle) -> PlayerCommand {
        if self.kick_cooldown > 0 {
            self.kick_cooldown -= 1;
        }

        let (Some(me), Some(ball)) = (physics.position(self.entity), physics.position(BALL_ID))
        else {
            return PlayerCommand::idle();
        };

        // Stand slightly on the defending side of the ball so contact
        // sends it the right way.
        let behind_offset = match side {
            Side::Home => -APPROACH_DISTANCE,
            Side::Away => APPROACH_DISTANCE,
        };
        let target = Vec2::new(ball.x + behind_offset, ball.y);

        let to_target = target - me;
        let direction = if to_target.length() < 2.0 {
            Vec2::ZERO
        } else {
            to_target.normalized()
        };

        let in_range = me.distance(ball) <= KICK_RANGE;
        let goal_side_of_ball = match side {
            Side::Home => me.x <= ball.x + APPROACH_DISTANCE,
            Side::Away => me.x >= ball.x - APPROACH_DISTANCE,
        };
        let kick = in_range && goal_side_of_ball && self.kick_cooldown == 0;
        if kick {
            self.kick_cooldown = KICK_COOLDOWN_TICKS;
        }

        PlayerCommand { direction, kick }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyKind, PitchPhysics};

    #[test]
    fn test_ai_chases_ball() {
        let mut physics = PitchPhysics::new();
        physics.create_body(2, BodyKind::Player, Vec2::new(100.0, 250.0));
        physics.create_body(BALL_ID, BodyKind::Ball, Vec2::new(400.0, 250.0));

        let mut ai = AiController::new(2);
        let command = ai.decide(Side::Home, &physics);

        assert!(command.direction.x > 0.0);
        assert!(!command.kick);
    }

    #[test]
    fn test_ai_kicks_in_range_with_cooldown() {
        let mut physics = PitchPhysics::new();
        physics.create_body(2, BodyKind::Player, Vec2::new(395.0, 250.0));
        physics.create_body(BALL_ID, BodyKind::Ball, Vec2::new(400.0, 250.0));

        let mut ai = AiController::new(2);
        let first = ai.decide(Side::Home, &physics);
        let second = ai.decide(Side::Home, &physics);

        assert!(first.kick);
        assert!(!second.kick);
    }

    #[test]
    fn test_ai_does_not_kick_toward_own_goal() {
        let mut physics = PitchPhysics::new();
        // Home AI standing on the attacking side of the ball.
        physics.create_body(2, BodyKind::Player, Vec2::new(410.0, 250.0));
        physics.create_body(BALL_ID, BodyKind::Ball, Vec2::new(400.0, 250.0));

        let mut ai = AiController::new(2);
        let command = ai.decide(Side::Home, &physics);

        assert!(!command.kick);
    }
}
