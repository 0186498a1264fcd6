//! Exchange-facing request and response types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OrderType, Side};

/// Order submission request.
///
/// LIMIT orders carry a price; MARKET orders do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderRequest {
    pub symbol: String,
    pub side: Side,
    pub type_order: OrderType,
    pub price: Option<Decimal>,
    pub quantity: Decimal,
}

impl NewOrderRequest {
    pub fn limit_buy(symbol: impl Into<String>, price: Decimal, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side: Side::Buy,
            type_order: OrderType::Limit,
            price: Some(price),
            quantity,
        }
    }

    pub fn limit_sell(symbol: impl Into<String>, price: Decimal, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side: Side::Sell,
            type_order: OrderType::Limit,
            price: Some(price),
            quantity,
        }
    }

    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            type_order: OrderType::Market,
            price: None,
            quantity,
        }
    }
}

/// Exchange-reported order state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeOrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    PendingCancel,
    Rejected,
    Expired,
    #[serde(other)]
    Unknown,
}

impl ExchangeOrderStatus {
    pub fn is_filled(&self) -> bool {
        matches!(self, ExchangeOrderStatus::Filled)
    }
}

/// A single execution reported in an order acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeFill {
    pub price: Decimal,
    pub qty: Decimal,
}

/// Acknowledgement returned by the exchange for a new order
#[derive(Debug, Clone)]
pub struct OrderAck {
    pub exchange_order_id: String,
    pub status: ExchangeOrderStatus,
    pub executed_qty: Decimal,
    pub fills: Vec<ExchangeFill>,
}

/// Current state of a previously submitted order
#[derive(Debug, Clone)]
pub struct OrderReport {
    pub exchange_order_id: String,
    pub status: ExchangeOrderStatus,
    pub price: Decimal,
    pub executed_qty: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_limit_buy_carries_price() {
        let request = NewOrderRequest::limit_buy("BTCUSDT", dec!(95000.00), dec!(0.01));
        assert_eq!(request.side, Side::Buy);
        assert_eq!(request.type_order, OrderType::Limit);
        assert_eq!(request.price, Some(dec!(95000.00)));
    }

    #[test]
    fn test_market_order_has_no_price() {
        let request = NewOrderRequest::market("ETHUSDT", Side::Sell, dec!(1.5));
        assert_eq!(request.type_order, OrderType::Market);
        assert_eq!(request.price, None);
    }

    #[test]
    fn test_status_deserializes_wire_names() {
        let status: ExchangeOrderStatus = serde_json::from_str(r#""FILLED""#).unwrap();
        assert!(status.is_filled());

        let status: ExchangeOrderStatus = serde_json::from_str(r#""PARTIALLY_FILLED""#).unwrap();
        assert_eq!(status, ExchangeOrderStatus::PartiallyFilled);
        assert!(!status.is_filled());

        // Statuses added by the exchange later must not break parsing
        let status: ExchangeOrderStatus = serde_json::from_str(r#""EXPIRED_IN_MATCH""#).unwrap();
        assert_eq!(status, ExchangeOrderStatus::Unknown);
    }
}
