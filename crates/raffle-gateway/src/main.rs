//! Raffle gateway binary.
//!
//! Configuration comes from `RAFFLE_*` environment variables, log filtering
//! from `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use raffle_gateway::{GatewayConfig, RaffleGatewayService};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = GatewayConfig::from_env();

    let service =
        RaffleGatewayService::new(config).context("Failed to initialise raffle gateway")?;

    service
        .run(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("[raffle] Received shutdown signal");
            }
        })
        .await
        .context("Raffle gateway stopped with an error")?;

    Ok(())
}
