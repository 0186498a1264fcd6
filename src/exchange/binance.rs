//! Binance spot REST client
//!
//! Implements the [`ExchangeClient`] capability over the Binance spot API.
//! Credentials are passed per call so one client instance serves every user.
//! Requests are spaced by a minimum gap to stay inside the exchange rate
//! limits; mutating calls are issued exactly once (a retry on an ambiguous
//! failure could double-place an order).

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use super::auth;
use super::types::{ExchangeFill, ExchangeOrderStatus, NewOrderRequest, OrderAck, OrderReport};
use super::{ExchangeClient, ExchangeError};
use crate::config::ExchangeConfig;
use crate::types::{Credential, OrderType};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderAckWire {
    order_id: u64,
    status: ExchangeOrderStatus,
    #[serde(default)]
    executed_qty: Decimal,
    #[serde(default)]
    fills: Vec<ExchangeFill>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderReportWire {
    order_id: u64,
    status: ExchangeOrderStatus,
    #[serde(default)]
    price: Decimal,
    #[serde(default)]
    executed_qty: Decimal,
}

#[derive(Deserialize)]
struct PriceTickerWire {
    price: Decimal,
}

/// Binance spot API client
pub struct BinanceSpotClient {
    http: reqwest::Client,
    base_url: String,
    recv_window_ms: u64,
    request_gap: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl BinanceSpotClient {
    pub fn new(config: &ExchangeConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            recv_window_ms: config.recv_window_ms,
            request_gap: Duration::from_millis(config.request_gap_ms),
            last_request: Mutex::new(None),
        }
    }

    /// Space requests by the configured minimum gap
    async fn throttle(&self) {
        if self.request_gap.is_zero() {
            return;
        }
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.request_gap {
                sleep(self.request_gap - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Build a signed URL: query parameters + recvWindow + timestamp, with
    /// the HMAC signature appended last
    fn signed_url(
        &self,
        credential: &Credential,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> String {
        let mut query = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&format!(
            "recvWindow={}&timestamp={}",
            self.recv_window_ms,
            auth::timestamp_ms()
        ));

        let signature = auth::sign_query(&query, &credential.secret_key);
        format!("{}{}?{}&signature={}", self.base_url, endpoint, query, signature)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ExchangeError> {
        self.throttle().await;

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ExchangeError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        serde_json::from_str(&text).map_err(|err| ExchangeError::Parse(format!("{err}: {text}")))
    }

    fn order_params(request: &NewOrderRequest) -> Result<Vec<(&'static str, String)>, ExchangeError> {
        let mut params = vec![
            ("symbol", request.symbol.clone()),
            ("side", request.side.as_str().to_string()),
            ("type", request.type_order.as_str().to_string()),
            ("quantity", request.quantity.to_string()),
        ];

        if request.type_order == OrderType::Limit {
            let price = request.price.ok_or_else(|| {
                ExchangeError::InvalidOrder("LIMIT order without a price".to_string())
            })?;
            params.push(("timeInForce", "GTC".to_string()));
            params.push(("price", price.to_string()));
        }

        Ok(params)
    }
}

#[async_trait::async_trait]
impl ExchangeClient for BinanceSpotClient {
    async fn get_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let url = format!("{}/api/v3/ticker/price?symbol={}", self.base_url, symbol);
        let ticker: PriceTickerWire = self.execute(self.http.get(&url)).await?;

        debug!(symbol, price = %ticker.price, "Fetched market price");
        Ok(ticker.price)
    }

    async fn submit_order(
        &self,
        credential: &Credential,
        request: &NewOrderRequest,
    ) -> Result<OrderAck, ExchangeError> {
        let params = Self::order_params(request)?;
        let url = self.signed_url(credential, "/api/v3/order", &params);

        let ack: OrderAckWire = self
            .execute(
                self.http
                    .post(&url)
                    .header("X-MBX-APIKEY", &credential.api_key),
            )
            .await?;

        debug!(
            symbol = %request.symbol,
            side = %request.side,
            order_id = ack.order_id,
            status = ?ack.status,
            "Order submitted"
        );

        Ok(OrderAck {
            exchange_order_id: ack.order_id.to_string(),
            status: ack.status,
            executed_qty: ack.executed_qty,
            fills: ack.fills,
        })
    }

    async fn check_order(
        &self,
        credential: &Credential,
        symbol: &str,
        exchange_order_id: &str,
    ) -> Result<OrderReport, ExchangeError> {
        let params = vec![
            ("symbol", symbol.to_string()),
            ("orderId", exchange_order_id.to_string()),
        ];
        let url = self.signed_url(credential, "/api/v3/order", &params);

        let report: OrderReportWire = self
            .execute(
                self.http
                    .get(&url)
                    .header("X-MBX-APIKEY", &credential.api_key),
            )
            .await?;

        Ok(OrderReport {
            exchange_order_id: report.order_id.to_string(),
            status: report.status,
            price: report.price,
            executed_qty: report.executed_qty,
        })
    }

    async fn cancel_open_orders(
        &self,
        credential: &Credential,
        symbol: &str,
    ) -> Result<(), ExchangeError> {
        let params = vec![("symbol", symbol.to_string())];
        let url = self.signed_url(credential, "/api/v3/openOrders", &params);

        let _: serde_json::Value = self
            .execute(
                self.http
                    .delete(&url)
                    .header("X-MBX-APIKEY", &credential.api_key),
            )
            .await?;

        debug!(symbol, "Cancelled open orders");
        Ok(())
    }

    async fn ping(&self) -> Result<(), ExchangeError> {
        let url = format!("{}/api/v3/ping", self.base_url);
        let _: serde_json::Value = self.execute(self.http.get(&url)).await?;
        Ok(())
    }
}
