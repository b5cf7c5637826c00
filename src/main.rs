//! Campaign relay server.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                    CAMPAIGN RELAY                     │
//!                      │                                                       │
//!   Landing page       │  ┌─────────┐   ┌──────────┐   ┌──────────────────┐   │
//!   ───────────────────┼─▶│  http   │──▶│  lookup  │──▶│ referrer         │   │
//!   POST /api/domains/ │  │ server  │   │ service  │   │ classifier       │   │
//!        test          │  └─────────┘   └────┬─────┘   └──────────────────┘   │
//!                      │                     │                                 │
//!                      │                     ├────────▶┌──────────────────┐   │
//!                      │                     │         │ domains resolver │   │
//!                      │                     │         │  → store (SQLite)│   │
//!                      │                     │         └──────────────────┘   │
//!                      │                     ▼                                 │
//!   { domain, rtkcid,  │              ┌──────────────┐                        │       Click
//!     isSpy }          │              │   tracking   │────────────────────────┼────▶ tracker
//!   ◀──────────────────┼──────────────│  forwarder   │◀───────────────────────┼──── trk.<domain>
//!                      │              └──────────────┘                        │
//!                      │                                                       │
//!                      │  config · observability · lifecycle · admin          │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use campaign_relay::config::loader::load_config;
use campaign_relay::config::AppConfig;
use campaign_relay::lifecycle::{wait_for_signal, Shutdown};
use campaign_relay::observability::{logging, metrics};
use campaign_relay::HttpServer;

#[derive(Parser)]
#[command(name = "campaign-relay", version)]
#[command(about = "Maps domains to tracking campaigns and flags spy referrers", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listener port, overriding the configured bind address's port.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(port) = args.port {
        config.listener.override_port(port);
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!("campaign-relay v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        database = %config.storage.database_path,
        config_file = ?args.config,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
