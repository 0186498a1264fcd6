//! Configuration management
//!
//! Handles the application configuration file (JSON) and the per-strategy
//! grid configuration document stored on each strategy row.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// `BINANCE_BASE_URL` in the environment overrides the configured
    /// exchange endpoint (useful for the spot testnet).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;
        let mut config: Config =
            serde_json::from_str(&contents).context("Failed to parse config JSON")?;

        if let Ok(base_url) = std::env::var("BINANCE_BASE_URL") {
            config.exchange.base_url = base_url;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            exchange: ExchangeConfig::default(),
            engine: EngineConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

/// Exchange client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Minimum gap between requests, in milliseconds
    #[serde(default = "default_request_gap_ms")]
    pub request_gap_ms: u64,
    /// recvWindow sent with signed requests
    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,
}

fn default_base_url() -> String {
    "https://api.binance.com".to_string()
}

fn default_request_gap_ms() -> u64 {
    100
}

fn default_recv_window_ms() -> u64 {
    5000
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            base_url: default_base_url(),
            request_gap_ms: default_request_gap_ms(),
            recv_window_ms: default_recv_window_ms(),
        }
    }
}

/// Engine scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between reconciliation ticks
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Disables the periodic loop entirely (test/maintenance mode)
    #[serde(default)]
    pub disabled: bool,
    /// Quote/stablecoin symbol excluded from bulk cancellation
    #[serde(default = "default_quote_symbol")]
    pub quote_symbol: String,
}

fn default_check_interval_secs() -> u64 {
    20
}

fn default_quote_symbol() -> String {
    "USDT".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            check_interval_secs: default_check_interval_secs(),
            disabled: false,
            quote_symbol: default_quote_symbol(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/tharseo.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: default_db_path(),
        }
    }
}

/// Error produced when a strategy's grid configuration cannot be used
#[derive(Debug, Error)]
pub enum GridConfigError {
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(&'static str),
}

/// Validated grid parameters for one strategy.
///
/// Parsed once at tradeflow-load time from the strategy's `config_strategy`
/// JSON document; malformed documents never reach the trading loop.
///
/// Percentages are plain numbers: `profitTarget: 10` means 10%.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    /// Maximum number of concurrently open ladder slots
    pub quantity_grids: u32,
    /// Profit target per rung, percent
    pub profit_target: Decimal,
    /// Price step between rungs, percent
    pub variable_order: Decimal,
    /// Quote amount spent per rung
    pub value_order: Decimal,
}

impl GridConfig {
    /// Parse and validate a `config_strategy` document
    pub fn parse(raw: &str) -> Result<Self, GridConfigError> {
        let config: GridConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), GridConfigError> {
        if self.quantity_grids == 0 {
            return Err(GridConfigError::Invalid("quantityGrids must be at least 1"));
        }
        if self.value_order <= Decimal::ZERO {
            return Err(GridConfigError::Invalid("valueOrder must be positive"));
        }
        if self.profit_target < Decimal::ZERO {
            return Err(GridConfigError::Invalid("profitTarget must not be negative"));
        }
        if self.variable_order < Decimal::ZERO || self.variable_order >= Decimal::ONE_HUNDRED {
            return Err(GridConfigError::Invalid(
                "variableOrder must be in the range [0, 100)",
            ));
        }
        Ok(())
    }
}
