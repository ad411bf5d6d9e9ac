//! # Beam Server
//!
//! Realtime slide synchronization server: a presenter drives the current
//! slide of a session and every joined participant follows.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! beam
//!
//! # Run with a config file picked up from ./beam.toml
//!
//! # Run with environment variables
//! BEAM_PORT=8080 BEAM_HOST=0.0.0.0 beam
//! ```

mod config;
mod handlers;
mod metrics;
mod rest;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beam=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;

    tracing::info!("Starting Beam server on {}:{}", config.host, config.port);

    // Initialize metrics
    metrics::init_metrics();

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}
