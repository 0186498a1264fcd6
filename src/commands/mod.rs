//! CLI subcommand implementations

pub mod cancel;
pub mod check;
pub mod order;
pub mod run;
pub mod start;

use anyhow::{Context, Result};
use std::sync::Arc;

use tharseo::config::Config;
use tharseo::engine::{GridEngine, OrderReconciler};
use tharseo::exchange::BinanceSpotClient;
use tharseo::store::SqliteStore;

/// Everything a subcommand needs, wired from the configuration file.
///
/// The engine and reconciler receive the exchange and store through their
/// capability interfaces; the concrete types live only here.
pub(crate) struct Components {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub exchange: Arc<BinanceSpotClient>,
    pub engine: GridEngine,
    pub reconciler: OrderReconciler,
}

pub(crate) fn build(config_path: &str) -> Result<Components> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    let store = Arc::new(SqliteStore::open(&config.database.path)?);
    let exchange = Arc::new(BinanceSpotClient::new(&config.exchange));

    let engine = GridEngine::new(exchange.clone(), store.clone(), store.clone());
    let reconciler = OrderReconciler::new(exchange.clone(), store.clone(), engine.clone());

    Ok(Components {
        config,
        store,
        exchange,
        engine,
        reconciler,
    })
}

pub(crate) fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")
}
