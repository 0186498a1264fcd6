//! Engine loop command
//!
//! Drives the order reconciler on a fixed interval until Ctrl-C. Each tick
//! checks live orders and then tops the grid ladders back up.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, warn};

use tharseo::exchange::ExchangeClient;

pub fn run(config_path: String, interval_override: Option<u64>) -> Result<()> {
    dotenv::dotenv().ok();

    let runtime = super::build_runtime()?;
    runtime.block_on(run_async(config_path, interval_override))
}

async fn run_async(config_path: String, interval_override: Option<u64>) -> Result<()> {
    let components = super::build(&config_path)?;

    if components.config.engine.disabled {
        warn!("Engine is disabled by configuration; not starting the loop");
        return Ok(());
    }

    let interval_secs =
        interval_override.unwrap_or(components.config.engine.check_interval_secs);

    components
        .exchange
        .ping()
        .await
        .context("Exchange is unreachable")?;

    info!("Exchange connectivity verified");
    info!("Database: {}", components.config.database.path);
    info!("Reconciliation interval: {}s", interval_secs);
    info!("Starting engine loop...");

    let mut tick = interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(err) = components.reconciler.run_tick().await {
                    error!("Reconciliation tick failed: {err}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping engine loop");
                break;
            }
        }
    }

    info!("Engine loop stopped");
    Ok(())
}
