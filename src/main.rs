//! Service-map reverse proxy (v1)
//!
//! A small API gateway built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                      GATEWAY                          │
//!                              │                                                       │
//!     Client Request           │  ┌─────────┐    ┌─────────┐    ┌──────────────┐      │
//!     ─────────────────────────┼─▶│  http   │───▶│ routing │───▶│   security   │      │
//!                              │  │ server  │    │  path   │    │  auth gate   │      │
//!                              │  └─────────┘    └─────────┘    └──────┬───────┘      │
//!                              │                                       │               │
//!                              │                                       ▼               │
//!                              │                               ┌──────────────┐       │
//!                              │                               │ service map  │       │
//!                              │                               │   resolve    │       │
//!                              │                               └──────┬───────┘       │
//!                              │                                       │               │
//!                              │                                       ▼               │
//!     Client Response          │  ┌─────────┐    ┌─────────┐    ┌──────────────┐      │
//!     ◀────────────────────────┼──│response │◀───│  cors   │◀───│   forward    │◀─────┼──── Backend
//!                              │  │  relay  │    │ headers │    │ (one call)   │      │     Service
//!                              │  └─────────┘    └─────────┘    └──────────────┘      │
//!                              │                                                       │
//!                              │  ┌─────────────────────────────────────────────────┐ │
//!                              │  │              Cross-Cutting Concerns              │ │
//!                              │  │  ┌─────────┐ ┌──────────┐ ┌──────────────────┐  │ │
//!                              │  │  │ config  │ │observa-  │ │    lifecycle     │  │ │
//!                              │  │  │ + env   │ │ bility   │ │ signals/shutdown │  │ │
//!                              │  │  └─────────┘ └──────────┘ └──────────────────┘  │ │
//!                              │  └─────────────────────────────────────────────────┘ │
//!                              └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use service_map_proxy::config::loader;
use service_map_proxy::observability::{logging, metrics};
use service_map_proxy::{HttpServer, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "service-map-proxy", version, about = "Service-map reverse proxy")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener address, overrides config and environment
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (mut config, file_error) = loader::load(cli.config.as_deref(), |key| std::env::var(key).ok())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("service-map-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(e) = file_error {
        tracing::error!(error = %e, "Failed to load config file, using defaults");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mount_path = %config.gateway.mount_path,
        services = config.services.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let signal_task = shutdown.trigger_on_signal();
    server.run(listener, shutdown.subscribe()).await?;
    signal_task.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
