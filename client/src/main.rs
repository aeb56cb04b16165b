use clap::Parser;
use client::discovery;
use client::network::SessionClient;
use log::{info, warn};
use server::network::{ServerConfig, SessionServer};
use shared::PlayerState;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session host to join directly (skips discovery)
    #[arg(short, long)]
    server: Option<String>,

    /// Session TCP port
    #[arg(short, long, default_value_t = shared::SESSION_PORT)]
    port: u16,

    /// Host a session in this process and join it
    #[arg(long)]
    host: bool,

    /// Discovery timeout in milliseconds
    #[arg(short, long, default_value = "1500")]
    timeout: u64,

    /// Constant input delta to send every frame, as DX,DY
    #[arg(short, long, value_parser = parse_drive, default_value = "0,0")]
    drive: (i32, i32),
}

fn parse_drive(s: &str) -> Result<(i32, i32), String> {
    let (dx, dy) = s
        .split_once(',')
        .ok_or_else(|| format!("expected DX,DY, got '{}'", s))?;

    let dx = dx.trim().parse().map_err(|_| format!("bad dx '{}'", dx))?;
    let dy = dy.trim().parse().map_err(|_| format!("bad dy '{}'", dy))?;
    Ok((dx, dy))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let host = if args.host {
        info!("Hosting session in-process");
        let session_server = SessionServer::bind(ServerConfig::default()).await?;
        tokio::spawn(session_server.run());
        "127.0.0.1".to_string()
    } else if let Some(server) = args.server {
        server
    } else {
        let sessions = discovery::discover(Duration::from_millis(args.timeout)).await?;
        match sessions.first() {
            Some(session) => {
                info!("Joining session at {}", session.host);
                session.host.clone()
            }
            None => {
                warn!("No sessions found");
                return Ok(());
            }
        }
    };

    let session = SessionClient::connect(&host, args.port).await?;
    let (dx, dy) = args.drive;

    // Headless frame loop: push input and report the mirror as it changes.
    let mut ticker = tokio::time::interval(Duration::from_millis(16));
    let mut last: Vec<PlayerState> = Vec::new();

    while session.is_running() {
        ticker.tick().await;
        session.send_input(dx, dy).await;

        let players = session.players();
        if players != last {
            let summary: Vec<String> = players
                .iter()
                .map(|p| format!("{}:({:.0},{:.0})", p.id, p.x, p.y))
                .collect();
            info!("Players: [{}]", summary.join(" "));
            last = players;
        }
    }

    info!("Session ended");
    Ok(())
}
