//! Core data types shared across the trading engine

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Round a monetary value to 2 decimal places, midpoint away from zero.
///
/// Every price, quantity and profit figure the engine produces goes through
/// this before it is submitted or persisted.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(format!("invalid order side: {other}")),
        }
    }
}

/// Order lifecycle status.
///
/// PENDENTE -> EXECUTADA on fill, PENDENTE -> CANCELADO via bulk cancel.
/// Both EXECUTADA and CANCELADO are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pendente,
    Executada,
    Cancelado,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendente => "PENDENTE",
            OrderStatus::Executada => "EXECUTADA",
            OrderStatus::Cancelado => "CANCELADO",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDENTE" => Ok(OrderStatus::Pendente),
            "EXECUTADA" => Ok(OrderStatus::Executada),
            "CANCELADO" => Ok(OrderStatus::Cancelado),
            other => Err(format!("invalid order status: {other}")),
        }
    }
}

/// Exchange order type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            other => Err(format!("invalid order type: {other}")),
        }
    }
}

/// Per-user exchange API credentials.
///
/// Read-only input to exchange calls; the engine never writes these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub api_key: String,
    pub secret_key: String,
}

impl Credential {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

/// A persisted order row.
///
/// Engine-created orders always come in BUY/SELL pairs linked bidirectionally
/// through `pair_order_id`. A paired SELL keeps `id_order_exchange` empty
/// until its BUY is observed filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub asset_id: i64,
    pub user_id: i64,
    pub strategy_id: Option<i64>,
    pub pair_order_id: Option<i64>,
    pub side: Side,
    pub status: OrderStatus,
    pub type_order: OrderType,
    pub open_price: Decimal,
    pub close_price: Option<Decimal>,
    pub target_price: Option<Decimal>,
    pub quantity: Decimal,
    pub id_order_exchange: String,
    pub open_date: DateTime<Utc>,
    pub close_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub result: Option<Decimal>,
    pub performance: Option<Decimal>,
}

impl Order {
    /// Whether the order is live on the exchange (submitted and not closed)
    pub fn is_live(&self) -> bool {
        self.status == OrderStatus::Pendente && !self.id_order_exchange.is_empty()
    }
}
