//! Live-room danmaku client entry point
//!
//! Run with:
//! ```bash
//! cargo run -p danmu-client -- <ROOM> [SERVER]
//! ```
//!
//! Settings other than the positional arguments are loaded from environment
//! variables (see `ClientConfig::from_env`).

use clap::Parser;
use danmu_client::{ConsoleSink, RoomResolver, Session};
use danmu_common::{try_init_tracing_with_config, AppResult, ClientConfig, TracingConfig};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Print the chat stream of a live room
#[derive(Parser, Debug)]
#[command(name = "danmu")]
#[command(version, about, long_about = None)]
struct Args {
    /// Room number as shown in the room URL
    room: u64,

    /// Broadcast server WebSocket URL (overrides DANMU_SERVER_URL)
    server: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(args, config).await {
        error!(error = %e, code = e.error_code(), "danmu stopped");
        std::process::exit(e.exit_code());
    }
}

async fn run(args: Args, config: ClientConfig) -> AppResult<()> {
    let config = match args.server {
        Some(url) => config.with_server_url(url),
        None => config,
    };
    info!(
        app = %config.app.name,
        env = ?config.app.env,
        server = %config.server.url,
        "Configuration loaded"
    );

    let resolver = RoomResolver::new(&config.resolver)?;
    let room_id = resolver.resolve(args.room).await?;

    let session = Session::builder(room_id)
        .url(&config.server.url)
        .config(config.session.clone())
        .sink(Arc::new(ConsoleSink::new()))
        .connect()
        .await?;

    let closer = session.closer();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, closing session");
                closer.close();
            }
            Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    session.run().await?;
    Ok(())
}
