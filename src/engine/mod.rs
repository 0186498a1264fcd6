//! Trading core: grid ladder maintenance and order reconciliation
//!
//! [`GridEngine`] tops up the buy ladder per active tradeflow;
//! [`OrderReconciler`] polls live orders on a fixed interval, advances their
//! state and chains back into the engine. Both consume the exchange and
//! store capability traits, wired in by the caller.

pub mod cancel;
pub mod grid;
pub mod market;
pub mod reconciler;

pub use cancel::cancel_open_orders;
pub use grid::GridEngine;
pub use market::place_market_order;
pub use reconciler::OrderReconciler;

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted exchange double shared by the engine unit tests

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use crate::exchange::{
        ExchangeClient, ExchangeError, ExchangeFill, ExchangeOrderStatus, NewOrderRequest,
        OrderAck, OrderReport,
    };
    use crate::types::{Credential, OrderType};

    pub struct MockExchange {
        pub price: Mutex<Decimal>,
        next_id: AtomicU64,
        pub submitted: Mutex<Vec<NewOrderRequest>>,
        pub cancelled: Mutex<Vec<String>>,
        filled: Mutex<HashMap<String, Decimal>>,
        fail_submits_after: Mutex<Option<usize>>,
        fail_submit_symbols: Mutex<HashSet<String>>,
        fail_check_ids: Mutex<HashSet<String>>,
        fail_cancel_symbols: Mutex<HashSet<String>>,
        market_status: Mutex<ExchangeOrderStatus>,
    }

    impl MockExchange {
        pub fn new(price: Decimal) -> Self {
            Self {
                price: Mutex::new(price),
                next_id: AtomicU64::new(1),
                submitted: Mutex::new(Vec::new()),
                cancelled: Mutex::new(Vec::new()),
                filled: Mutex::new(HashMap::new()),
                fail_submits_after: Mutex::new(None),
                fail_submit_symbols: Mutex::new(HashSet::new()),
                fail_check_ids: Mutex::new(HashSet::new()),
                fail_cancel_symbols: Mutex::new(HashSet::new()),
                market_status: Mutex::new(ExchangeOrderStatus::Filled),
            }
        }

        /// Mark an exchange order as filled at `price`
        pub fn fill(&self, exchange_order_id: &str, price: Decimal) {
            self.filled
                .lock()
                .unwrap()
                .insert(exchange_order_id.to_string(), price);
        }

        /// Fail every submission after the first `n` have succeeded
        pub fn fail_submits_after(&self, n: usize) {
            *self.fail_submits_after.lock().unwrap() = Some(n);
        }

        pub fn fail_submits_for(&self, symbol: &str) {
            self.fail_submit_symbols
                .lock()
                .unwrap()
                .insert(symbol.to_string());
        }

        pub fn fail_check_for(&self, exchange_order_id: &str) {
            self.fail_check_ids
                .lock()
                .unwrap()
                .insert(exchange_order_id.to_string());
        }

        pub fn fail_cancel_for(&self, symbol: &str) {
            self.fail_cancel_symbols
                .lock()
                .unwrap()
                .insert(symbol.to_string());
        }

        pub fn reject_market_orders(&self) {
            *self.market_status.lock().unwrap() = ExchangeOrderStatus::Rejected;
        }

        pub fn submitted_count(&self) -> usize {
            self.submitted.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ExchangeClient for MockExchange {
        async fn get_price(&self, _symbol: &str) -> Result<Decimal, ExchangeError> {
            Ok(*self.price.lock().unwrap())
        }

        async fn submit_order(
            &self,
            _credential: &Credential,
            request: &NewOrderRequest,
        ) -> Result<OrderAck, ExchangeError> {
            if self
                .fail_submit_symbols
                .lock()
                .unwrap()
                .contains(&request.symbol)
            {
                return Err(ExchangeError::Api {
                    status: 503,
                    message: format!("submission rejected for {}", request.symbol),
                });
            }
            {
                let mut submitted = self.submitted.lock().unwrap();
                if let Some(limit) = *self.fail_submits_after.lock().unwrap() {
                    if submitted.len() >= limit {
                        return Err(ExchangeError::Api {
                            status: 503,
                            message: "submission rejected".to_string(),
                        });
                    }
                }
                submitted.push(request.clone());
            }

            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            match request.type_order {
                OrderType::Market => {
                    let price = *self.price.lock().unwrap();
                    Ok(OrderAck {
                        exchange_order_id: id.to_string(),
                        status: *self.market_status.lock().unwrap(),
                        executed_qty: request.quantity,
                        fills: vec![ExchangeFill {
                            price,
                            qty: request.quantity,
                        }],
                    })
                }
                OrderType::Limit => Ok(OrderAck {
                    exchange_order_id: id.to_string(),
                    status: ExchangeOrderStatus::New,
                    executed_qty: Decimal::ZERO,
                    fills: Vec::new(),
                }),
            }
        }

        async fn check_order(
            &self,
            _credential: &Credential,
            _symbol: &str,
            exchange_order_id: &str,
        ) -> Result<OrderReport, ExchangeError> {
            if self
                .fail_check_ids
                .lock()
                .unwrap()
                .contains(exchange_order_id)
            {
                return Err(ExchangeError::Api {
                    status: 500,
                    message: format!("check failed for {exchange_order_id}"),
                });
            }

            match self.filled.lock().unwrap().get(exchange_order_id) {
                Some(price) => Ok(OrderReport {
                    exchange_order_id: exchange_order_id.to_string(),
                    status: ExchangeOrderStatus::Filled,
                    price: *price,
                    executed_qty: Decimal::ZERO,
                }),
                None => Ok(OrderReport {
                    exchange_order_id: exchange_order_id.to_string(),
                    status: ExchangeOrderStatus::New,
                    price: Decimal::ZERO,
                    executed_qty: Decimal::ZERO,
                }),
            }
        }

        async fn cancel_open_orders(
            &self,
            _credential: &Credential,
            symbol: &str,
        ) -> Result<(), ExchangeError> {
            if self.fail_cancel_symbols.lock().unwrap().contains(symbol) {
                return Err(ExchangeError::Api {
                    status: 500,
                    message: format!("cancel failed for {symbol}"),
                });
            }
            self.cancelled.lock().unwrap().push(symbol.to_string());
            Ok(())
        }

        async fn ping(&self) -> Result<(), ExchangeError> {
            Ok(())
        }
    }
}
