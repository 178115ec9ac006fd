//! Frame sender - pushes placeholder JPEGs into a running relay
//!
//! Run with: cargo run --example send_frames -- [SERVER_URL] [screen|webcam|both] [COUNT]
//!
//! Examples:
//!   cargo run --example send_frames                                  # screen, forever
//!   cargo run --example send_frames -- http://localhost:3000 webcam 50
//!   cargo run --example send_frames -- http://localhost:3000 both     # one client, two streams
//!
//! Open a WebSocket to `/view` on the same relay to watch the frames arrive.

use frame_relay::client::{ClientConfig, FramePublisher};
use frame_relay::registry::{ClientId, StreamKind};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("frame_relay=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let server_url = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| frame_relay::client::config::DEFAULT_SERVER_URL.to_string());
    let kinds = match args.get(2).map(String::as_str) {
        None => vec![StreamKind::Screen],
        Some("both") => vec![StreamKind::Screen, StreamKind::Webcam],
        Some(kind) => vec![kind.parse()?],
    };
    let limit: Option<u64> = args.get(3).map(|s| s.parse()).transpose()?;

    // Both streams of one capture agent share a client id
    let client_id = ClientId::random();
    println!("Sending as client {}", client_id);

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut tasks = Vec::new();
    for kind in kinds {
        let config = ClientConfig::new(server_url.clone(), kind).client_id(client_id.clone());
        println!("Upload URL: {}", config.upload_url()?);
        tasks.push(tokio::spawn(send(config, limit, stop_rx.clone())));
    }

    let all_done = futures::future::join_all(tasks);
    tokio::pin!(all_done);
    let results = tokio::select! {
        results = &mut all_done => results,
        _ = tokio::signal::ctrl_c() => {
            println!("\nStopping...");
            let _ = stop_tx.send(true);
            all_done.await
        }
    };

    for result in results {
        result??;
    }
    Ok(())
}

/// Stream one kind until `limit` frames are sent or `stop` fires
async fn send(
    config: ClientConfig,
    limit: Option<u64>,
    mut stop: watch::Receiver<bool>,
) -> frame_relay::Result<()> {
    let kind = config.kind;
    let mut publisher = FramePublisher::connect(config)?;

    let sent = tokio::select! {
        result = publisher.run_paced(|| None, limit) => result?,
        _ = stop.changed() => publisher.frames_sent(),
    };

    let status = publisher.finish().await?;
    println!("Sent {} {} frames, relay answered {}", sent, kind, status);
    Ok(())
}
