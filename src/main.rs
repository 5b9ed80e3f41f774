//! Certificate registrar service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Host (attempt completed)          Operator (CLI / admin API)
//!              │                                  │
//!              ▼                                  ▼
//!     ┌─────────────────────────────────────────────────────────┐
//!     │  http: /attempts/complete        admin: /admin/...      │
//!     └───────────────┬─────────────────────────┬───────────────┘
//!                     ▼                         ▼
//!             ┌───────────────────────────────────────┐
//!             │ certificates::trigger (per-attempt lock)│
//!             └───────────────────┬───────────────────┘
//!                                 ▼
//!             ┌───────────────────────────────────────┐      ┌──────────┐
//!             │ certificates::manager (state machine) │─────▶│  store   │
//!             └──────┬────────────────────────┬───────┘      └──────────┘
//!                    ▼                        ▼
//!             ┌────────────┐         ┌─────────────────┐
//!             │  settings  │         │   blockchain    │────▶ EVM node
//!             │ (per call) │         │ (alloy gateway) │
//!             └────────────┘         └─────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use cert_registrar::config::{load_config, RegistrarConfig};
use cert_registrar::lifecycle::{assemble, signals::wait_for_signal, Shutdown};
use cert_registrar::observability::{logging::init_logging, metrics::init_metrics};
use cert_registrar::HttpServer;

#[derive(Parser)]
#[command(name = "cert-registrar")]
#[command(about = "Registers course certificates on an EVM certificate registry", long_about = None)]
struct Args {
    /// Path to the TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RegistrarConfig::default(),
    };

    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = ?args.config,
        bind_address = %config.server.bind_address,
        "cert-registrar starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let triggers = assemble(&config)?;

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, triggers);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    tracing::info!("Shutdown signal received, draining requests");
    shutdown.trigger();

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
