use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod domain;
mod frontend;
mod messaging;
mod metrics;
mod services;
mod utils;

use config::{Config, ServiceKind};

/// Pizza order relay: store, kitchen and delivery apps talking through a Dapr sidecar
#[derive(Parser, Debug)]
#[command(name = "pizza_relay", version, about)]
struct Cli {
    /// Which app to run
    #[arg(value_enum)]
    service: ServiceKind,

    /// Port to listen on (overrides APP_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Values from .env never override variables already set
    dotenvy::dotenv().ok();

    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug pizza_relay store
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pizza_relay=debug")),
        )
        .init();

    let mut config = Config::from_env(cli.service)?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        app_id = config.service.app_id(),
        metrics = metrics.registry().gather().len(),
        "📊 Metrics registry created"
    );

    services::run(config, metrics).await
}
