//! Keyboard capture with per-tick edge detection.

use macroquad::prelude::*;
use shared::math::Vec2;
use shared::session::PlayerCommand;

/// One tick's sampled input.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputFrame {
    pub command: PlayerCommand,
    pub restart: bool,
    pub quit: bool,
}

/// Samples movement and action keys once per tick. Kick and restart are
/// edge-triggered against the previous tick's state so holding a key
/// produces exactly one event.
pub struct InputManager {
    prev_kick: bool,
    prev_restart: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            prev_kick: false,
            prev_restart: false,
        }
    }

    pub fn update(&mut self) -> InputFrame {
        let mut direction = Vec2::ZERO;
        if is_key_down(KeyCode::A) || is_key_down(KeyCode::Left) {
            direction.x -= 1.0;
        }
        if is_key_down(KeyCode::D) || is_key_down(KeyCode::Right) {
            direction.x += 1.0;
        }
        if is_key_down(KeyCode::W) || is_key_down(KeyCode::Up) {
            direction.y -= 1.0;
        }
        if is_key_down(KeyCode::S) || is_key_down(KeyCode::Down) {
            direction.y += 1.0;
        }

        let kick_down = is_key_down(KeyCode::Space);
        let restart_down = is_key_down(KeyCode::R);

        let frame = InputFrame {
            command: PlayerCommand {
                direction,
                kick: kick_down && !self.prev_kick,
            },
            restart: restart_down && !self.prev_restart,
            quit: is_key_down(KeyCode::Escape),
        };

        self.prev_kick = kick_down;
        self.prev_restart = restart_down;

        frame
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
