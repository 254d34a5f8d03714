//! HTTP Server Binary for the Argus API
//!
//! Serves batch scoring of the dashboard metrics and live scoring of the
//! deposit feed.
//!
//! Usage:
//!   cargo run --bin http_server -- --host 0.0.0.0 --port 8000 --config ./argus.json

use argus::{api::anomaly_api::AnomalyApi, config::ArgusConfig, http::start_server, logging};
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "Argus HTTP Server")]
#[command(about = "HTTP API server for the Argus anomaly scoring engine", long_about = None)]
struct Args {
    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short = 'H', long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Samples kept in the live window
    #[arg(long)]
    live_capacity: Option<usize>,

    /// Seed of the isolation forest
    #[arg(long)]
    scorer_seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            ArgusConfig::from_file(path)?
        }
        None => ArgusConfig::default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(capacity) = args.live_capacity {
        config.live.capacity = capacity;
    }
    if let Some(seed) = args.scorer_seed {
        config.scorer.seed = seed;
    }

    info!(
        "Live window: {} samples, scoring after {}, span {}",
        config.live.capacity, config.live.min_samples, config.live.span
    );
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let api = Arc::new(AnomalyApi::new(config)?);

    // Set up graceful shutdown
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C signal handler: {}", e);
        }
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        result = start_server(&addr, api) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal => {
            info!("Server shut down gracefully");
        }
    }

    Ok(())
}
