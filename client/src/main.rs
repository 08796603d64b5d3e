mod game;
mod input;
mod network;
mod rendering;

use clap::Parser;
use game::ClientGame;
use input::InputManager;
use log::info;
use macroquad::prelude::*;
use network::NetClient;
use rendering::{Renderer, WINDOW_HEIGHT, WINDOW_WIDTH};
use shared::session::MatchConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:7777")]
    server: String,

    /// Simulate network latency in milliseconds
    #[arg(short = 'l', long, default_value = "0")]
    fake_ping: u64,

    /// Development mode: verbose diagnostics by default
    #[arg(long)]
    dev: bool,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Kickabout".to_string(),
        window_width: WINDOW_WIDTH as i32,
        window_height: WINDOW_HEIGHT as i32,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let args = Args::parse();

    let default_filter = if args.dev { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    info!("Connecting to relay at {}", args.server);
    if args.fake_ping > 0 {
        info!("Simulating {}ms latency", args.fake_ping);
    }
    info!("Controls: WASD/arrows to move, Space to kick, R for a new match");

    let net = match NetClient::connect(&args.server, args.fake_ping) {
        Ok(net) => net,
        Err(e) => {
            eprintln!("Failed to start networking: {}", e);
            return;
        }
    };

    let mut game = ClientGame::new(net, MatchConfig::default());
    let mut input = InputManager::new();
    let mut renderer = Renderer::new();

    loop {
        let frame = input.update();
        if frame.quit {
            break;
        }

        game.update(get_frame_time(), frame);
        renderer.render(&game.view());

        next_frame().await;
    }

    game.shutdown();
}
