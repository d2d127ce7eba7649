//! SofaBridge Server - Standalone HTTP server for SofaBridge.
//!
//! Exposes zone grouping, playback and the universal-remote endpoints over
//! HTTP. Designed to run as a background daemon next to the speakers.

mod config;

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sofabridge_core::{bootstrap_services, start_server};
use tokio::signal;

use crate::config::ServerConfig;

/// SofaBridge Server - HTTP control for Sonos zones.
#[derive(Parser, Debug)]
#[command(name = "sofabridge-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "SOFABRIDGE_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Speaker address to seed the directory with. Repeatable.
    #[arg(short = 's', long = "speaker", value_name = "IP")]
    speakers: Vec<String>,

    /// Room that leads groups built by the music shortcuts.
    #[arg(short = 'z', long)]
    default_zone: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("SofaBridge Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.bind_port = port;
    }
    if !args.speakers.is_empty() {
        config.core.speakers = args.speakers;
    }
    if let Some(zone) = args.default_zone {
        config.core.default_zone = zone;
    }

    log::info!(
        "Configuration: bind_port={}, default_zone={}, speakers={:?}",
        config.bind_port,
        config.core.default_zone,
        config.core.speakers
    );

    let services = bootstrap_services(&config.core).context("Failed to bootstrap services")?;
    log::info!("Services bootstrapped successfully");

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.bind_port));
    start_server(services.app_state(), addr, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
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

    log::info!("Shutdown signal received, cleaning up...");
}
