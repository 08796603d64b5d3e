use crate::game::{BodyView, ViewPhase, ViewState};
use macroquad::prelude::*;
use shared::wire::PowerUpKind;
use shared::{
    side_of, MatchOutcome, Side, BALL_ID, BALL_RADIUS, GOAL_DEPTH, GOAL_MOUTH, PITCH_HEIGHT,
    PITCH_WIDTH, PLAYER_RADIUS,
};

/// Vertical offset leaving room for the scoreboard above the pitch.
pub const PITCH_OFFSET_Y: f32 = 60.0;
pub const WINDOW_WIDTH: f32 = PITCH_WIDTH + GOAL_DEPTH * 2.0;
pub const WINDOW_HEIGHT: f32 = PITCH_HEIGHT + PITCH_OFFSET_Y + 20.0;

const PITCH_OFFSET_X: f32 = GOAL_DEPTH;

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn render(&mut self, view: &ViewState) {
        clear_background(Color::from_rgba(18, 26, 18, 255));

        self.draw_pitch();

        if let Some(item) = &view.powerup {
            let color = match item.kind {
                PowerUpKind::SpeedBoost => Color::from_rgba(80, 200, 255, 255),
                PowerUpKind::PowerKick => Color::from_rgba(255, 170, 60, 255),
            };
            let at = to_screen(item.position.x, item.position.y);
            draw_circle(at.0, at.1, 10.0, color);
            draw_circle_lines(at.0, at.1, 10.0, 2.0, WHITE);
        }

        for body in &view.bodies {
            self.draw_body(body, view.local_side);
        }

        self.draw_scoreboard(view);
        self.draw_overlay(view);
        self.draw_flashes(view);
    }

    fn draw_pitch(&self) {
        // Field
        draw_rectangle(
            PITCH_OFFSET_X,
            PITCH_OFFSET_Y,
            PITCH_WIDTH,
            PITCH_HEIGHT,
            Color::from_rgba(34, 102, 51, 255),
        );
        draw_rectangle_lines(
            PITCH_OFFSET_X,
            PITCH_OFFSET_Y,
            PITCH_WIDTH,
            PITCH_HEIGHT,
            3.0,
            WHITE,
        );

        // Halfway line and center circle
        let center = to_screen(PITCH_WIDTH / 2.0, PITCH_HEIGHT / 2.0);
        draw_line(
            center.0,
            PITCH_OFFSET_Y,
            center.0,
            PITCH_OFFSET_Y + PITCH_HEIGHT,
            2.0,
            WHITE,
        );
        draw_circle_lines(center.0, center.1, 60.0, 2.0, WHITE);

        // Goal mouths
        let mouth_top = PITCH_OFFSET_Y + (PITCH_HEIGHT - GOAL_MOUTH) / 2.0;
        draw_rectangle(
            PITCH_OFFSET_X - GOAL_DEPTH,
            mouth_top,
            GOAL_DEPTH,
            GOAL_MOUTH,
            Color::from_rgba(60, 60, 60, 255),
        );
        draw_rectangle(
            PITCH_OFFSET_X + PITCH_WIDTH,
            mouth_top,
            GOAL_DEPTH,
            GOAL_MOUTH,
            Color::from_rgba(60, 60, 60, 255),
        );
    }

    fn draw_body(&self, body: &BodyView, local_side: Option<Side>) {
        let at = to_screen(body.position.x, body.position.y);

        if body.entity == BALL_ID {
            draw_circle(at.0, at.1, BALL_RADIUS, WHITE);
            draw_circle_lines(at.0, at.1, BALL_RADIUS, 1.5, BLACK);
            return;
        }

        let side = side_of(body.entity);
        let color = match side {
            Some(Side::Home) => Color::from_rgba(70, 130, 255, 255),
            Some(Side::Away) => Color::from_rgba(255, 80, 80, 255),
            None => GRAY,
        };
        draw_circle(at.0, at.1, PLAYER_RADIUS, color);

        // The entity you steer gets a white ring.
        let is_local_human = local_side.map(|s| s.human_id()) == Some(body.entity);
        if is_local_human {
            draw_circle_lines(at.0, at.1, PLAYER_RADIUS + 2.0, 2.0, WHITE);
        } else {
            draw_circle_lines(at.0, at.1, PLAYER_RADIUS, 1.0, BLACK);
        }
    }

    fn draw_scoreboard(&self, view: &ViewState) {
        let score_text = format!("{} - {}", view.score.0, view.score.1);
        let size = measure_text(&score_text, None, 40, 1.0);
        draw_text(
            &score_text,
            (WINDOW_WIDTH - size.width) / 2.0,
            40.0,
            40.0,
            WHITE,
        );

        let clock_text = format!(
            "{}:{:02}",
            view.seconds_remaining / 60,
            view.seconds_remaining % 60
        );
        draw_text(&clock_text, WINDOW_WIDTH - 80.0, 40.0, 28.0, WHITE);

        if let Some(side) = view.local_side {
            let (label, color) = match side {
                Side::Home => ("YOU: BLUE", Color::from_rgba(70, 130, 255, 255)),
                Side::Away => ("YOU: RED", Color::from_rgba(255, 80, 80, 255)),
            };
            draw_text(label, 16.0, 40.0, 24.0, color);
        }
    }

    fn draw_overlay(&self, view: &ViewState) {
        let text = match view.phase {
            ViewPhase::Connecting => Some("Connecting to relay...".to_string()),
            ViewPhase::WaitingForPeer => Some("Waiting for an opponent...".to_string()),
            ViewPhase::Ended(outcome) => {
                let headline = match outcome {
                    MatchOutcome::Winner(Side::Home) => "BLUE WINS",
                    MatchOutcome::Winner(Side::Away) => "RED WINS",
                    MatchOutcome::Draw => "DRAW",
                    MatchOutcome::PeerDisconnected => "OPPONENT LEFT",
                };
                Some(format!("{} - press R for a new match", headline))
            }
            ViewPhase::Playing => None,
        };

        if let Some(text) = text {
            draw_rectangle(
                0.0,
                0.0,
                WINDOW_WIDTH,
                WINDOW_HEIGHT,
                Color::from_rgba(0, 0, 0, 120),
            );
            let size = measure_text(&text, None, 32, 1.0);
            draw_text(
                &text,
                (WINDOW_WIDTH - size.width) / 2.0,
                WINDOW_HEIGHT / 2.0,
                32.0,
                WHITE,
            );
        }
    }

    fn draw_flashes(&self, view: &ViewState) {
        for (i, text) in view.flashes.iter().enumerate() {
            let size = measure_text(text, None, 28, 1.0);
            draw_text(
                text,
                (WINDOW_WIDTH - size.width) / 2.0,
                PITCH_OFFSET_Y + 30.0 + i as f32 * 28.0,
                28.0,
                YELLOW,
            );
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn to_screen(x: f32, y: f32) -> (f32, f32) {
    (x + PITCH_OFFSET_X, y + PITCH_OFFSET_Y)
}
