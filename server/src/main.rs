use clap::Parser;
use log::info;
use server::network::{ServerConfig, SessionServer};
use server::registry::WorldBounds;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the session listener to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Session TCP port
    #[arg(short, long, default_value_t = shared::SESSION_PORT)]
    port: u16,

    /// Discovery UDP port
    #[arg(short, long, default_value_t = shared::DISCOVERY_PORT)]
    discovery_port: u16,

    /// Disable the discovery responder
    #[arg(long)]
    no_discovery: bool,

    /// Host advertised in discovery replies; set this to the LAN address
    /// when binding 0.0.0.0
    #[arg(short, long)]
    advertise: Option<String>,

    /// Snapshot broadcasts per second
    #[arg(short, long, default_value = "30")]
    tick_rate: u32,

    /// Clamp positions to WIDTHxHEIGHT (e.g. 1000x700); unbounded if unset
    #[arg(short, long, value_parser = parse_bounds)]
    world: Option<WorldBounds>,
}

fn parse_bounds(s: &str) -> Result<WorldBounds, String> {
    let (width, height) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;

    let width: f32 = width.parse().map_err(|_| format!("bad width '{}'", width))?;
    let height: f32 = height
        .parse()
        .map_err(|_| format!("bad height '{}'", height))?;

    if width <= 0.0 || height <= 0.0 {
        return Err("world dimensions must be positive".to_string());
    }
    Ok(WorldBounds { width, height })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let discovery_addr = if args.no_discovery {
        None
    } else {
        Some(format!("{}:{}", args.host, args.discovery_port))
    };

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        discovery_addr,
        advertise_host: args.advertise.unwrap_or_else(|| args.host.clone()),
        tick_rate: args.tick_rate,
        bounds: args.world,
    };

    let server = SessionServer::bind(config).await?;

    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_parse_accepts_width_x_height() {
        let bounds = parse_bounds("1000x700").unwrap();
        assert_eq!(bounds.width, 1000.0);
        assert_eq!(bounds.height, 700.0);
    }

    #[test]
    fn bounds_parse_rejects_garbage() {
        assert!(parse_bounds("1000").is_err());
        assert!(parse_bounds("x").is_err());
        assert!(parse_bounds("-5x100").is_err());
        assert!(parse_bounds("0x0").is_err());
    }
}
