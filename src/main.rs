//! Collaboration-platform BFF gateway.
//!
//! A backend-for-frontend gateway built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                   GATEWAY                     │
//!                     │                                               │
//!   Client Request    │  ┌────────┐   ┌───────────┐   ┌───────────┐  │
//!   ──────────────────┼─▶│  http  │──▶│ handlers  │──▶│   batch   │  │
//!                     │  │ server │   │(controllers)  │ processor │  │
//!                     │  └────────┘   └─────┬─────┘   └─────┬─────┘  │
//!                     │                     │               │        │
//!                     │              ┌──────▼─────┐   ┌─────▼─────┐  │
//!                     │              │   access   │   │   etag    │  │
//!                     │              │ enrichment │   │coordinator│  │
//!                     │              └──────┬─────┘   └─────┬─────┘  │
//!                     │                     │               │        │
//!                     │              ┌──────▼───────────────▼─────┐  │
//!   Client Response   │              │        proxy client        │◀─┼── Upstream
//!   ◀─────────────────┼──────────────│  (bearer token, timeouts)  │  │   Services
//!                     │              └────────────────────────────┘  │
//!                     │                                               │
//!                     │  Cross-cutting: config · observability ·      │
//!                     │  lifecycle · request context                  │
//!                     └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use collab_gateway::config::loader::load_config;
use collab_gateway::{GatewayConfig, HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "collab-gateway", about = "Collaboration platform BFF gateway")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    collab_gateway::observability::logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstreams = config.upstreams.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            collab_gateway::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown).await?;

    Ok(())
}
