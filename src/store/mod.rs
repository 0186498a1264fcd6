//! Order and strategy persistence
//!
//! The trading core consumes the [`OrderStore`] and [`TradeflowSource`]
//! capability traits; [`SqliteStore`] implements both.

pub mod sqlite;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{Credential, Order, OrderStatus, OrderType, Side};
pub use sqlite::SqliteStore;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("stored value is not a valid number: {0}")]
    Numeric(String),
}

/// Draft for one side of an engine-created order pair.
///
/// Rows are created PENDENTE and active; the store stamps the open date.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub asset_id: i64,
    pub user_id: i64,
    pub strategy_id: i64,
    pub side: Side,
    pub type_order: OrderType,
    pub open_price: Decimal,
    pub target_price: Decimal,
    pub quantity: Decimal,
    /// Empty for the not-yet-submitted SELL leg
    pub id_order_exchange: String,
}

/// A market order that executed immediately and is recorded closed
#[derive(Debug, Clone)]
pub struct ExecutedOrder {
    pub asset_id: i64,
    pub user_id: i64,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub id_order_exchange: String,
}

/// Partial update applied to an order after an exchange check.
///
/// When `result`, `strategy_id` and `performance` are all present the store
/// also accumulates profit and performance into the parent strategy.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub close_date: Option<DateTime<Utc>>,
    pub close_price: Option<Decimal>,
    pub id_order_exchange: Option<String>,
    pub result: Option<Decimal>,
    pub strategy_id: Option<i64>,
    pub performance: Option<Decimal>,
}

impl OrderPatch {
    /// Patch marking an order executed at `close_price`
    pub fn fill(close_price: Decimal, close_date: DateTime<Utc>) -> Self {
        Self {
            status: Some(OrderStatus::Executada),
            close_date: Some(close_date),
            close_price: Some(close_price),
            ..Self::default()
        }
    }

    /// Patch recording the exchange id of a just-submitted order
    pub fn exchange_id(id: impl Into<String>) -> Self {
        Self {
            id_order_exchange: Some(id.into()),
            ..Self::default()
        }
    }

    /// The (strategy, result, performance) triple, when the patch books profit
    pub fn booked_profit(&self) -> Option<(i64, Decimal, Decimal)> {
        match (self.strategy_id, self.result, self.performance) {
            (Some(strategy_id), Some(result), Some(performance)) => {
                Some((strategy_id, result, performance))
            }
            _ => None,
        }
    }
}

/// The sibling order joined onto a pending order
#[derive(Debug, Clone)]
pub struct PairInfo {
    pub id: i64,
    pub close_price: Option<Decimal>,
    pub target_price: Option<Decimal>,
}

/// A pending order with everything the reconciler needs joined in
#[derive(Debug, Clone)]
pub struct PendingOrder {
    pub order: Order,
    pub symbol: String,
    pub credential: Credential,
    pub pair: Option<PairInfo>,
}

/// One active tradeflow with its asset, strategy and user joined in
#[derive(Debug, Clone)]
pub struct ActiveTradeflow {
    pub tradeflow_id: i64,
    pub asset_id: i64,
    pub symbol: String,
    pub strategy_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub config_strategy: String,
    pub credential: Credential,
}

/// Persistence capability consumed by the trading core
pub trait OrderStore: Send + Sync {
    /// Create a linked BUY/SELL pair; returns (buy_id, sell_id)
    fn create_pair(&self, buy: &OrderDraft, sell: &OrderDraft) -> Result<(i64, i64), StoreError>;

    /// All PENDENTE orders that are live on the exchange, joined with
    /// user/credential/symbol/pair data
    fn pending_with_exchange_id(&self) -> Result<Vec<PendingOrder>, StoreError>;

    /// Number of PENDENTE SELL orders for an asset (occupied ladder slots)
    fn count_pending_sell(&self, asset_id: i64) -> Result<u32, StoreError>;

    /// Apply a fill update; rolls profit into the strategy when the patch
    /// books it
    fn apply_fill_update(&self, order_id: i64, patch: &OrderPatch) -> Result<(), StoreError>;

    /// Distinct symbols with a PENDENTE order for the user, excluding the
    /// quote symbol
    fn distinct_pending_symbols(
        &self,
        user_id: i64,
        excluded_symbol: &str,
    ) -> Result<Vec<String>, StoreError>;

    /// Mark all of the user's PENDENTE orders CANCELADO; returns row count
    fn bulk_cancel(&self, user_id: i64) -> Result<u64, StoreError>;

    /// Exchange credentials for a user
    fn user_credential(&self, user_id: i64) -> Result<Credential, StoreError>;

    /// Exchange symbol for an asset
    fn asset_symbol(&self, asset_id: i64) -> Result<String, StoreError>;

    /// Record a market order that filled immediately (EXECUTADA on create)
    fn record_executed_order(&self, record: &ExecutedOrder) -> Result<i64, StoreError>;
}

/// Source of the active tradeflows driving the grid engine
pub trait TradeflowSource: Send + Sync {
    fn active_tradeflows(&self) -> Result<Vec<ActiveTradeflow>, StoreError>;
}
