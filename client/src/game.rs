//! Per-frame glue between the fixed-rate session pipeline, the network
//! thread, and the renderer.
//!
//! The render loop runs at whatever rate the display gives us; the
//! simulation runs at the fixed tick rate. An accumulator converts one
//! into the other, and edge-triggered inputs only fire on the first tick
//! of a frame.

use crate::input::InputFrame;
use crate::network::NetClient;
use log::{debug, info, warn};
use shared::physics::{PhysicsOracle, PitchPhysics};
use shared::powerup::SpawnedItem;
use shared::session::{MatchConfig, MatchOutcome, MatchPhase, Notice, Session};
use shared::wire::{decode_message, Envelope, Message, PowerUpKind, PROTOCOL_VERSION};
use shared::{EntityId, Side, Vec2, BALL_ID, TEAM_SIZE, TICK_DT};

/// Resend cadence for connection upkeep, in ticks (1 s at 60 Hz).
const JOIN_RETRY_TICKS: u64 = 60;
const KEEPALIVE_TICKS: u64 = 60;
const FLASH_SECS: f64 = 2.5;
/// Largest frame time folded into the accumulator; anything longer (a
/// dragged window, a breakpoint) is dropped instead of replayed.
const MAX_FRAME_TIME: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewPhase {
    Connecting,
    WaitingForPeer,
    Playing,
    Ended(MatchOutcome),
}

pub struct BodyView {
    pub entity: EntityId,
    pub position: Vec2,
}

/// Everything the renderer needs for one frame.
pub struct ViewState {
    pub phase: ViewPhase,
    pub local_side: Option<Side>,
    pub score: (u8, u8),
    pub seconds_remaining: u32,
    pub bodies: Vec<BodyView>,
    pub powerup: Option<SpawnedItem>,
    pub flashes: Vec<String>,
}

pub struct ClientGame {
    net: NetClient,
    config: MatchConfig,
    session: Option<Session>,
    physics: PitchPhysics,
    pending: Vec<Message>,
    side: Option<Side>,
    ticks: u64,
    accumulator: f32,
    clock: f64,
    flashes: Vec<(String, f64)>,
}

impl ClientGame {
    pub fn new(net: NetClient, config: MatchConfig) -> Self {
        Self {
            net,
            config,
            session: None,
            physics: PitchPhysics::new(),
            pending: Vec::new(),
            side: None,
            ticks: 0,
            accumulator: 0.0,
            clock: 0.0,
            flashes: Vec::new(),
        }
    }

    /// Advances the simulation by however many fixed ticks the elapsed
    /// frame time covers.
    pub fn update(&mut self, dt: f32, mut frame: InputFrame) {
        self.clock += f64::from(dt);
        self.accumulator = (self.accumulator + dt).min(MAX_FRAME_TIME);

        while self.accumulator >= TICK_DT {
            self.accumulator -= TICK_DT;
            self.fixed_tick(frame);
            // Edges fire on the first tick of the frame only.
            frame.command.kick = false;
            frame.restart = false;
        }

        let clock = self.clock;
        self.flashes.retain(|(_, shown)| clock - shown < FLASH_SECS);
    }

    fn fixed_tick(&mut self, frame: InputFrame) {
        self.ticks += 1;
        self.connection_upkeep();

        let envelopes = self.net.drain();
        for envelope in envelopes {
            self.handle_envelope(envelope);
        }

        if frame.restart {
            self.request_restart();
        }

        let incoming = std::mem::take(&mut self.pending);
        let output = self
            .session
            .as_mut()
            .map(|session| session.tick(frame.command, incoming, &mut self.physics));

        if let Some(output) = output {
            for message in &output.outgoing {
                self.net.send_message(message);
            }
            for notice in output.notices {
                self.flash_notice(notice);
            }
        }
    }

    /// Join retries until the relay answers, keep-alives afterwards so
    /// the relay's liveness sweep doesn't reap a quiet client.
    fn connection_upkeep(&mut self) {
        if self.side.is_none() {
            if self.ticks % JOIN_RETRY_TICKS == 1 {
                self.net.send(Envelope::Join {
                    client_version: PROTOCOL_VERSION,
                });
            }
        } else if self.ticks % KEEPALIVE_TICKS == 0 {
            self.net.send(Envelope::KeepAlive);
        }
    }

    fn handle_envelope(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::Joined { side } => {
                if self.side.is_none() {
                    info!("Joined as {:?}", side);
                    self.side = Some(side);
                    self.session = Some(Session::new(side, self.config));
                }
            }

            Envelope::MatchStart { seed } => {
                let waiting = self
                    .session
                    .as_ref()
                    .map(|session| session.phase == MatchPhase::WaitingForPeer)
                    .unwrap_or(false);
                if !waiting {
                    debug!("MatchStart ignored in current phase");
                    return;
                }

                self.physics = PitchPhysics::new();
                if let Some(session) = self.session.as_mut() {
                    session.start(seed, &mut self.physics);
                }
                self.flash_text("KICK OFF!");
            }

            Envelope::Forward { data } => match decode_message(&data) {
                Ok(message) => self.pending.push(message),
                Err(e) => warn!("Dropping malformed peer message: {}", e),
            },

            Envelope::PeerLeft => {
                info!("Peer left the match");
                let notices = match self.session.as_mut() {
                    Some(session) => session.peer_left(),
                    None => Vec::new(),
                };
                for notice in notices {
                    self.flash_notice(notice);
                }
                self.flash_text("OPPONENT DISCONNECTED");
            }

            Envelope::Join { .. } | Envelope::KeepAlive | Envelope::Leave => {
                debug!("Unexpected client-to-relay envelope received");
            }
        }
    }

    /// After a finished match, R re-enters the matchmaking queue.
    fn request_restart(&mut self) {
        let ended = self
            .session
            .as_ref()
            .map(|session| session.phase == MatchPhase::Ended)
            .unwrap_or(false);
        if !ended {
            return;
        }

        info!("Requesting a new match");
        self.net.send(Envelope::Leave);
        self.session = None;
        self.side = None;
        self.physics = PitchPhysics::new();
        self.pending.clear();
        self.net.send(Envelope::Join {
            client_version: PROTOCOL_VERSION,
        });
    }

    pub fn shutdown(&self) {
        self.net.send(Envelope::Leave);
    }

    fn flash_notice(&mut self, notice: Notice) {
        let text = match notice {
            Notice::GoalScored(side) => Some(format!("GOAL FOR {}!", side_name(side))),
            Notice::PowerUpCollected { side, kind } => {
                Some(format!("{} {}", side_name(side), powerup_name(kind)))
            }
            Notice::MatchEnded(outcome) => Some(match outcome {
                MatchOutcome::Winner(side) => format!("{} WINS!", side_name(side)),
                MatchOutcome::Draw => "DRAW".to_string(),
                MatchOutcome::PeerDisconnected => "MATCH ABANDONED".to_string(),
            }),
            // Kicks are audible, not worth a banner.
            Notice::BallKicked(_) => None,
        };
        if let Some(text) = text {
            self.flash_text(&text);
        }
    }

    fn flash_text(&mut self, text: &str) {
        self.flashes.push((text.to_string(), self.clock));
    }

    pub fn view(&self) -> ViewState {
        let phase = match (&self.session, self.side) {
            (None, _) | (_, None) => ViewPhase::Connecting,
            (Some(session), Some(_)) => match session.phase {
                MatchPhase::WaitingForPeer => ViewPhase::WaitingForPeer,
                MatchPhase::Active => ViewPhase::Playing,
                MatchPhase::Ended => {
                    ViewPhase::Ended(session.outcome.unwrap_or(MatchOutcome::Draw))
                }
            },
        };

        let mut bodies = Vec::new();
        let mut push_body = |entity: EntityId| {
            if let Some(position) = self.physics.position(entity) {
                bodies.push(BodyView { entity, position });
            }
        };
        push_body(BALL_ID);
        for side in [Side::Home, Side::Away] {
            for entity in side.team_ids(TEAM_SIZE) {
                push_body(entity);
            }
        }

        let (score, seconds_remaining, powerup) = match &self.session {
            Some(session) => (
                (session.score.home, session.score.away),
                session.seconds_remaining(),
                session.active_powerup(),
            ),
            None => ((0, 0), 0, None),
        };

        ViewState {
            phase,
            local_side: self.side,
            score,
            seconds_remaining,
            bodies,
            powerup,
            flashes: self.flashes.iter().map(|(text, _)| text.clone()).collect(),
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.net.is_closed()
    }
}

fn side_name(side: Side) -> &'static str {
    match side {
        Side::Home => "BLUE",
        Side::Away => "RED",
    }
}

fn powerup_name(kind: PowerUpKind) -> &'static str {
    match kind {
        PowerUpKind::SpeedBoost => "GRABBED SPEED BOOST",
        PowerUpKind::PowerKick => "GRABBED POWER KICK",
    }
}
