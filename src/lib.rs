//! Tharseo grid trading engine
//!
//! Automates a grid strategy against Binance spot markets: each active
//! tradeflow gets a ladder of LIMIT BUY rungs below the market price, every
//! rung paired with a not-yet-submitted SELL at its profit target. A
//! periodic reconciler detects fills, releases paired sells, books profit
//! into the parent strategy and tops the ladders back up.
//!
//! The core consumes three capability interfaces:
//! - [`exchange::ExchangeClient`] for price lookup, order submission,
//!   status checks and bulk cancels (implemented by
//!   [`exchange::BinanceSpotClient`])
//! - [`store::OrderStore`] and [`store::TradeflowSource`] for persistence
//!   (implemented by [`store::SqliteStore`])
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use tharseo::config::Config;
//! use tharseo::engine::{GridEngine, OrderReconciler};
//! use tharseo::exchange::BinanceSpotClient;
//! use tharseo::store::SqliteStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_file("configs/engine.json")?;
//!     let store = Arc::new(SqliteStore::open(&config.database.path)?);
//!     let exchange = Arc::new(BinanceSpotClient::new(&config.exchange));
//!
//!     let engine = GridEngine::new(exchange.clone(), store.clone(), store.clone());
//!     let reconciler = OrderReconciler::new(exchange, store, engine);
//!     reconciler.run_tick().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod store;
pub mod types;

pub use config::{Config, GridConfig};
pub use engine::{GridEngine, OrderReconciler};
pub use error::EngineError;
pub use exchange::{BinanceSpotClient, ExchangeClient};
pub use store::{OrderStore, SqliteStore, TradeflowSource};
pub use types::*;
