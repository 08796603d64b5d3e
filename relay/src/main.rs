mod lobby;
mod network;

use clap::Parser;
use log::info;
use network::Relay;

/// Default relay port; overridable with --port or KICKABOUT_PORT.
const DEFAULT_PORT: u16 = 7777;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (defaults to KICKABOUT_PORT or 7777)
    #[arg(short, long)]
    port: Option<u16>,

    /// Development mode: verbose diagnostics by default
    #[arg(long)]
    dev: bool,
}

fn resolve_port(args: &Args) -> u16 {
    args.port
        .or_else(|| {
            std::env::var("KICKABOUT_PORT")
                .ok()
                .and_then(|value| value.parse().ok())
        })
        .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_filter = if args.dev { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let address = format!("{}:{}", args.host, resolve_port(&args));
    info!("Starting relay on {}", address);

    let mut relay = Relay::new(&address).await?;
    relay.run().await?;

    Ok(())
}
