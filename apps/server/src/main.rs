//! Meetcap Server - standalone ingestion server for meeting recordings.
//!
//! Accepts the binary WebSocket protocol, writes telemetry and audio to a
//! `live/` working directory, and promotes finished sessions into a sealed
//! `completed/` archive once the post-archive pipeline has run.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use meetcap_core::{bootstrap_services, start_server, AppState};

use crate::config::ServerConfig;

/// Meetcap Server - headless meeting-recording ingestion daemon.
#[derive(Parser, Debug)]
#[command(name = "meetcap-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "MEETCAP_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long, env = "MEETCAP_PORT")]
    port: Option<u16>,

    /// Recordings root directory (overrides config file).
    #[arg(short = 'r', long, env = "MEETCAP_RECORDINGS_ROOT")]
    recordings_root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Meetcap Server v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(recordings_root) = args.recordings_root {
        config.recordings_root = recordings_root;
    }

    let core_config = config.to_core_config().context("Invalid configuration")?;

    log::info!(
        "Configuration: port={}, recordingsRoot={}, summarisationProvider={:?}",
        core_config.port,
        core_config.recordings_root,
        core_config.summarisation_provider,
    );

    let services = bootstrap_services(&core_config)
        .await
        .context("Failed to bootstrap services")?;

    log::info!("Services bootstrapped successfully");

    let app_state = AppState::builder()
        .from_services(&services)
        .config(Arc::new(core_config))
        .build();

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(app_state).await {
            log::error!("Server error: {e}");
        }
    });

    log::info!("HTTP server started");

    shutdown_signal().await;

    log::info!("Shutdown signal received, cleaning up...");

    services.shutdown().await;
    server_handle.abort();

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
