//! Voting engine (jukevote-engine) - Main entry point
//!
//! Hosts the request-admission core behind an HTTP/WebSocket surface:
//! clients connect to /ws and exchange the JSON message protocol.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jukevote_common::config::EngineConfig;
use jukevote_engine::api::{self, AppContext};
use jukevote_engine::VotingEngine;

/// Command-line arguments for jukevote-engine
#[derive(Parser, Debug)]
#[command(name = "jukevote-engine")]
#[command(about = "Song-request voting engine for live events")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "JUKEVOTE_PORT")]
    port: Option<u16>,

    /// Path to a TOML config file
    #[arg(short, long, env = "JUKEVOTE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jukevote_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting jukevote-engine v{}", env!("CARGO_PKG_VERSION"));

    let mut config = EngineConfig::load(args.config.as_deref());
    if let Some(port) = args.port {
        config.port = port;
    }
    info!(
        "Resort every {}s, metrics every {}s",
        config.resort_interval_secs, config.metrics_interval_secs
    );

    let engine = Arc::new(VotingEngine::with_builtin_catalog(config.clone()));
    let app = api::build_router(AppContext { engine });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

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
