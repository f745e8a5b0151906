//! Treasury HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p treasury-server --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p treasury-server
//!
//! # Configure logging level
//! RUST_LOG=treasury=debug,info cargo run -p treasury-server
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to TOML configuration file (default: `config.toml`)
//! - `HOST` - Override bind address (default: `0.0.0.0`)
//! - `PORT` - Override port (default: `4030`)
//! - `RUST_LOG` - Log level filter (default: `info`)

use std::net::SocketAddr;

use axum::http::Method;
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use treasury_server::config::ServerConfig;
use treasury_server::{AppState, treasury_router};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Treasury server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        owners = config.treasury.multisig.owners.len(),
        required_signatures = config.treasury.multisig.required_signatures,
        genesis = config.genesis.len(),
        "Loaded configuration"
    );

    if config.genesis.is_empty() {
        tracing::warn!("No genesis balances configured; deposits will fail until funded");
    }

    let addr = SocketAddr::new(config.host, config.port);
    let state = AppState::from_config(config)?;

    let app = treasury_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Treasury listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Treasury shut down gracefully");
    Ok(())
}

/// Resolves once the process is asked to stop.
async fn shutdown_signal() {
    let signal = stop_requested().await;
    tracing::info!(signal, "stop requested, draining in-flight requests");
}

#[cfg(unix)]
async fn stop_requested() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let Ok(mut terminate) = signal(SignalKind::terminate()) else {
        tracing::warn!("SIGTERM handler unavailable, only Ctrl-C stops the treasury");
        let _ = tokio::signal::ctrl_c().await;
        return "ctrl_c";
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "ctrl_c",
        _ = terminate.recv() => "sigterm",
    }
}

#[cfg(not(unix))]
async fn stop_requested() -> &'static str {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    "ctrl_c"
}
