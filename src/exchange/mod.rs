//! Exchange access layer
//!
//! The engine consumes the [`ExchangeClient`] capability trait; the concrete
//! [`BinanceSpotClient`] implements it over the Binance spot REST API.

pub mod auth;
pub mod binance;
pub mod types;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::Credential;
pub use binance::BinanceSpotClient;
pub use types::{ExchangeFill, ExchangeOrderStatus, NewOrderRequest, OrderAck, OrderReport};

/// Errors from the exchange access layer
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("exchange API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse exchange response: {0}")]
    Parse(String),

    #[error("invalid order request: {0}")]
    InvalidOrder(String),
}

/// Capability interface the trading core consumes.
///
/// Credentials are supplied per call; the client itself holds no account
/// state and can be shared across users.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Current market price for a symbol
    async fn get_price(&self, symbol: &str) -> Result<Decimal, ExchangeError>;

    /// Submit a new order and return the exchange's acknowledgement
    async fn submit_order(
        &self,
        credential: &Credential,
        request: &NewOrderRequest,
    ) -> Result<OrderAck, ExchangeError>;

    /// Look up the current state of a previously submitted order
    async fn check_order(
        &self,
        credential: &Credential,
        symbol: &str,
        exchange_order_id: &str,
    ) -> Result<OrderReport, ExchangeError>;

    /// Cancel every open order on a symbol for the credential's account
    async fn cancel_open_orders(
        &self,
        credential: &Credential,
        symbol: &str,
    ) -> Result<(), ExchangeError>;

    /// Connectivity probe
    async fn ping(&self) -> Result<(), ExchangeError>;
}
