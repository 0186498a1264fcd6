//! Grid engine: per-tradeflow buy ladder maintenance
//!
//! One pass walks every active tradeflow and, when the ladder has free
//! slots, places descending-price LIMIT BUY rungs paired with not-yet
//! submitted SELL orders at the profit target.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::config::GridConfig;
use crate::error::EngineError;
use crate::exchange::{ExchangeClient, NewOrderRequest};
use crate::store::{ActiveTradeflow, OrderDraft, OrderStore, TradeflowSource};
use crate::types::{round2, OrderType, Side};

#[derive(Clone)]
pub struct GridEngine {
    exchange: Arc<dyn ExchangeClient>,
    store: Arc<dyn OrderStore>,
    tradeflows: Arc<dyn TradeflowSource>,
    /// Tradeflows with a pass currently in flight. Serializes the
    /// count-slots-then-submit sequence so overlapping passes cannot
    /// jointly overshoot `quantity_grids`.
    leases: Arc<Mutex<HashSet<i64>>>,
}

/// Releases the tradeflow lease when the pass finishes
struct TradeflowLease {
    leases: Arc<Mutex<HashSet<i64>>>,
    tradeflow_id: i64,
}

impl Drop for TradeflowLease {
    fn drop(&mut self) {
        self.leases.lock().unwrap().remove(&self.tradeflow_id);
    }
}

impl GridEngine {
    pub fn new(
        exchange: Arc<dyn ExchangeClient>,
        store: Arc<dyn OrderStore>,
        tradeflows: Arc<dyn TradeflowSource>,
    ) -> Self {
        Self {
            exchange,
            store,
            tradeflows,
            leases: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Run one engine pass over every active tradeflow.
    ///
    /// Tradeflows fan out as independent tasks; a failure in one never
    /// affects the others and never rolls back rows it already created.
    pub async fn run_pass(&self) -> Result<(), EngineError> {
        let flows = self.tradeflows.active_tradeflows()?;
        info!("Active tradeflows located: {}", flows.len());

        let mut tasks = JoinSet::new();
        for flow in flows {
            let engine = self.clone();
            tasks.spawn(async move {
                let owner = format!("{} - {}", flow.user_name, flow.user_email);
                match engine.process_tradeflow(&flow).await {
                    Ok(0) => {}
                    Ok(placed) => {
                        info!(
                            tradeflow = flow.tradeflow_id,
                            symbol = %flow.symbol,
                            owner = %owner,
                            placed,
                            "Ladder topped up"
                        );
                    }
                    Err(err) => {
                        error!(
                            tradeflow = flow.tradeflow_id,
                            symbol = %flow.symbol,
                            owner = %owner,
                            "Tradeflow pass failed: {err}"
                        );
                    }
                }
            });
        }
        while tasks.join_next().await.is_some() {}

        Ok(())
    }

    fn try_lease(&self, tradeflow_id: i64) -> Option<TradeflowLease> {
        let mut held = self.leases.lock().unwrap();
        if held.insert(tradeflow_id) {
            Some(TradeflowLease {
                leases: Arc::clone(&self.leases),
                tradeflow_id,
            })
        } else {
            None
        }
    }

    /// Top up one tradeflow's ladder. Returns the number of rungs placed.
    async fn process_tradeflow(&self, flow: &ActiveTradeflow) -> Result<u32, EngineError> {
        let Some(_lease) = self.try_lease(flow.tradeflow_id) else {
            info!(
                tradeflow = flow.tradeflow_id,
                "Pass already in flight, skipping"
            );
            return Ok(0);
        };

        let config = GridConfig::parse(&flow.config_strategy)?;

        let open_slots = self.store.count_pending_sell(flow.asset_id)?;
        if open_slots >= config.quantity_grids {
            info!(
                tradeflow = flow.tradeflow_id,
                symbol = %flow.symbol,
                open_slots,
                "Order limit reached, tradeflow not entered"
            );
            return Ok(0);
        }
        let available = config.quantity_grids - open_slots;

        let market_price = self.exchange.get_price(&flow.symbol).await?;
        if market_price <= Decimal::ZERO {
            return Err(EngineError::ServiceUnavailable(format!(
                "non-positive market price for {}",
                flow.symbol
            )));
        }

        let step = Decimal::ONE - config.variable_order / dec!(100);
        let markup = Decimal::ONE + config.profit_target / dec!(100);

        // Each rung prices off the previous one, so the loop is strictly
        // sequential. A submission failure aborts the remaining rungs of
        // this tradeflow only.
        let mut buy_price = round2(market_price);
        let mut placed = 0u32;
        for _ in 0..available {
            let target_price = round2(buy_price * markup);
            let quantity = round2(config.value_order / buy_price);

            let ack = self
                .exchange
                .submit_order(
                    &flow.credential,
                    &NewOrderRequest::limit_buy(flow.symbol.as_str(), buy_price, quantity),
                )
                .await?;

            let buy = OrderDraft {
                asset_id: flow.asset_id,
                user_id: flow.user_id,
                strategy_id: flow.strategy_id,
                side: Side::Buy,
                type_order: OrderType::Limit,
                open_price: buy_price,
                target_price,
                quantity,
                id_order_exchange: ack.exchange_order_id.clone(),
            };
            let sell = OrderDraft {
                side: Side::Sell,
                id_order_exchange: String::new(),
                ..buy.clone()
            };
            self.store.create_pair(&buy, &sell)?;
            placed += 1;

            info!(
                symbol = %flow.symbol,
                price = %buy_price,
                target = %target_price,
                quantity = %quantity,
                exchange_order = %ack.exchange_order_id,
                "Buy rung placed"
            );

            buy_price = round2(buy_price * step);
        }

        Ok(placed)
    }
}
