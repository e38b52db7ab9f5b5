//! zemer-dl - main entry point
//!
//! Starts the downloader HTTP service: loads configuration, builds the
//! router and serves until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zemer_common::config::Config;
use zemer_dl::{build_router, AppState};

/// Command-line arguments for zemer-dl
#[derive(Parser, Debug)]
#[command(name = "zemer-dl")]
#[command(about = "Zemereshet song-archive downloader service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to config.toml
    #[arg(short, long, env = "ZEMER_CONFIG")]
    config: Option<PathBuf>,

    /// Directory with the static web UI (overrides config)
    #[arg(short, long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zemer_dl=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(static_dir) = args.static_dir {
        config.server.static_dir = static_dir;
    }

    info!(
        "Starting zemer-dl v{} on port {}",
        env!("CARGO_PKG_VERSION"),
        config.server.port
    );
    info!("Static UI directory: {}", config.server.static_dir.display());

    let port = config.server.port;
    let state = AppState::new(config).context("Failed to initialize application state")?;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
