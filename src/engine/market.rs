//! Direct market orders outside the grid
//!
//! A market order either fills immediately and is recorded already closed,
//! or the exchange's refusal surfaces as ServiceUnavailable and nothing is
//! persisted.

use rust_decimal::Decimal;
use tracing::info;

use crate::error::EngineError;
use crate::exchange::{ExchangeClient, NewOrderRequest};
use crate::store::{ExecutedOrder, OrderStore};
use crate::types::{round2, Side};

pub async fn place_market_order(
    exchange: &dyn ExchangeClient,
    store: &dyn OrderStore,
    user_id: i64,
    asset_id: i64,
    side: Side,
    quantity: Decimal,
) -> Result<i64, EngineError> {
    let symbol = store.asset_symbol(asset_id)?;
    let credential = store.user_credential(user_id)?;

    let ack = exchange
        .submit_order(
            &credential,
            &NewOrderRequest::market(symbol.as_str(), side, quantity),
        )
        .await?;

    if !ack.status.is_filled() {
        return Err(EngineError::ServiceUnavailable(format!(
            "market order on {symbol} came back {:?}",
            ack.status
        )));
    }

    let fill_price = ack.fills.first().map(|fill| round2(fill.price));
    let order_id = store.record_executed_order(&ExecutedOrder {
        asset_id,
        user_id,
        side,
        quantity: ack.executed_qty,
        price: fill_price,
        id_order_exchange: ack.exchange_order_id.clone(),
    })?;

    info!(
        order_id,
        symbol = %symbol,
        side = %side,
        quantity = %ack.executed_qty,
        exchange_order = %ack.exchange_order_id,
        "Market order executed"
    );
    Ok(order_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::MockExchange;
    use crate::store::{SqliteStore, StoreError};
    use crate::types::{Credential, OrderStatus, OrderType};
    use rust_decimal_macros::dec;

    fn harness() -> (MockExchange, SqliteStore, i64, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let user_id = store.insert_user("Richard", "richard@example.com").unwrap();
        store
            .insert_credential(user_id, &Credential::new("key", "secret"))
            .unwrap();
        let asset_id = store.insert_asset("BTCUSDT").unwrap();
        (MockExchange::new(dec!(250.004)), store, user_id, asset_id)
    }

    #[tokio::test]
    async fn test_filled_market_order_is_recorded_closed() {
        let (exchange, store, user_id, asset_id) = harness();

        let order_id =
            place_market_order(&exchange, &store, user_id, asset_id, Side::Buy, dec!(0.5))
                .await
                .unwrap();

        let order = store.get_order(order_id).unwrap();
        assert_eq!(order.status, OrderStatus::Executada);
        assert_eq!(order.type_order, OrderType::Market);
        assert_eq!(order.open_price, dec!(250.00));
        assert_eq!(order.close_price, Some(dec!(250.00)));
        assert_eq!(order.quantity, dec!(0.5));
        assert!(order.close_date.is_some());
    }

    #[tokio::test]
    async fn test_rejected_market_order_persists_nothing() {
        let (exchange, store, user_id, asset_id) = harness();
        exchange.reject_market_orders();

        let err = place_market_order(&exchange, &store, user_id, asset_id, Side::Buy, dec!(0.5))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ServiceUnavailable(_)));

        assert!(matches!(
            store.get_order(1).unwrap_err(),
            StoreError::NotFound("order")
        ));
    }

    #[tokio::test]
    async fn test_unknown_asset_is_not_found() {
        let (exchange, store, user_id, _) = harness();

        let err = place_market_order(&exchange, &store, user_id, 9999, Side::Sell, dec!(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound("asset")));
    }
}
