//! Order reconciliation: fill detection and state transitions
//!
//! Each tick polls every PENDENTE order that is live on the exchange. A
//! filled BUY triggers submission of its paired SELL at the stored target
//! price; a filled SELL books profit and performance into the parent
//! strategy. The tick ends by re-running the grid engine so closed slots
//! are replenished immediately.

use chrono::Utc;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::{info, warn};

use super::grid::GridEngine;
use crate::error::EngineError;
use crate::exchange::{ExchangeClient, NewOrderRequest};
use crate::store::{OrderPatch, OrderStore, PendingOrder};
use crate::types::{round2, Side};

pub struct OrderReconciler {
    exchange: Arc<dyn ExchangeClient>,
    store: Arc<dyn OrderStore>,
    engine: GridEngine,
}

impl OrderReconciler {
    pub fn new(
        exchange: Arc<dyn ExchangeClient>,
        store: Arc<dyn OrderStore>,
        engine: GridEngine,
    ) -> Self {
        Self {
            exchange,
            store,
            engine,
        }
    }

    /// Run one reconciliation tick, then top the ladders back up
    pub async fn run_tick(&self) -> Result<(), EngineError> {
        let pending = self.store.pending_with_exchange_id()?;
        info!("Checking pending orders: {}", pending.len());

        for entry in &pending {
            // One order's exchange error must not abandon the rest of the batch
            if let Err(err) = self.reconcile_order(entry).await {
                warn!(
                    order = entry.order.id,
                    symbol = %entry.symbol,
                    "Reconciliation failed: {err}; continuing with remaining orders"
                );
            }
        }

        self.engine.run_pass().await
    }

    async fn reconcile_order(&self, entry: &PendingOrder) -> Result<(), EngineError> {
        let report = self
            .exchange
            .check_order(
                &entry.credential,
                &entry.symbol,
                &entry.order.id_order_exchange,
            )
            .await?;

        if !report.status.is_filled() {
            return Ok(());
        }

        let close_price = round2(report.price);
        let mut patch = OrderPatch::fill(close_price, Utc::now());

        if entry.order.side == Side::Sell {
            let buy_close = entry.pair.as_ref().and_then(|pair| pair.close_price);
            match (buy_close, entry.order.strategy_id) {
                (Some(buy_close), Some(strategy_id)) if !buy_close.is_zero() => {
                    let quantity = entry.order.quantity;
                    let total_buy = buy_close * quantity;
                    let total_sell = close_price * quantity;
                    let profit = total_sell - total_buy;

                    patch.result = Some(round2(profit));
                    patch.strategy_id = Some(strategy_id);
                    patch.performance = Some(round2(profit / total_buy * dec!(100)));
                }
                _ => {
                    warn!(
                        order = entry.order.id,
                        "Insufficient data to compute operation profit"
                    );
                }
            }
        }

        self.store.apply_fill_update(entry.order.id, &patch)?;
        info!(
            order = entry.order.id,
            side = %entry.order.side,
            symbol = %entry.symbol,
            price = %close_price,
            "Order executed"
        );

        // A filled BUY releases its paired SELL onto the exchange
        if entry.order.side == Side::Buy {
            let pair = entry
                .pair
                .as_ref()
                .ok_or(EngineError::NotFound("pair order"))?;
            let target_price = pair
                .target_price
                .ok_or(EngineError::NotFound("pair order target price"))?;

            let ack = self
                .exchange
                .submit_order(
                    &entry.credential,
                    &NewOrderRequest::limit_sell(
                        entry.symbol.as_str(),
                        target_price,
                        entry.order.quantity,
                    ),
                )
                .await?;

            self.store
                .apply_fill_update(pair.id, &OrderPatch::exchange_id(&ack.exchange_order_id))?;

            info!(
                order = pair.id,
                exchange_order = %ack.exchange_order_id,
                target = %target_price,
                "Paired sell submitted"
            );
        }

        Ok(())
    }
}
