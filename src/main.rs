//! Frame relay server
//!
//! Run with: cargo run -- [BIND_ADDR]
//!
//! Examples:
//!   frame-relay                    # binds to RELAY_BIND_ADDRESS or 0.0.0.0:3000
//!   frame-relay localhost          # binds to 127.0.0.1:3000
//!   frame-relay 127.0.0.1:8080     # binds to 127.0.0.1:8080
//!
//! Other settings come from `RELAY_*` environment variables; logging from
//! `RUST_LOG`.

use std::net::SocketAddr;

use frame_relay::{RelayServer, ServerConfig};

const DEFAULT_PORT: u16 = 3000;

fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

fn print_usage() {
    eprintln!("Usage: frame-relay [BIND_ADDR]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RELAY_BIND_ADDRESS           default 0.0.0.0:3000");
    eprintln!("  RELAY_MAX_FRAME_SIZE         bytes, default 10485760");
    eprintln!("  RELAY_VIEWER_QUEUE_CAPACITY  messages, default 64");
    eprintln!("  RELAY_IDLE_TIMEOUT_SECS      0 disables, default 0");
    eprintln!("  RELAY_MAX_CONNECTIONS        0 is unlimited, default 0");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frame_relay=debug,tower_http=info".into()),
        )
        .init();

    let mut config = ServerConfig::from_env()?;
    if let Some(addr_str) = args.get(1) {
        match parse_bind_addr(addr_str) {
            Ok(addr) => config = config.bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    tracing::info!(?config, "Starting frame relay");

    let server = RelayServer::new(config);
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bind_addr() {
        assert_eq!(
            parse_bind_addr("localhost").unwrap(),
            "127.0.0.1:3000".parse().unwrap()
        );
        assert_eq!(
            parse_bind_addr("0.0.0.0:8080").unwrap(),
            "0.0.0.0:8080".parse().unwrap()
        );
        assert!(parse_bind_addr("nope").is_err());
    }
}
