//! Direct market order command

use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use tracing::info;

use tharseo::engine::place_market_order;
use tharseo::types::Side;

pub fn run(
    config_path: String,
    user_id: i64,
    asset_id: i64,
    side: String,
    quantity: String,
) -> Result<()> {
    dotenv::dotenv().ok();

    let side: Side = side.parse().map_err(|err: String| anyhow!(err))?;
    let quantity: Decimal = quantity.parse().context("Invalid quantity")?;

    let runtime = super::build_runtime()?;
    runtime.block_on(async {
        let components = super::build(&config_path)?;

        let order_id = place_market_order(
            &*components.exchange,
            &*components.store,
            user_id,
            asset_id,
            side,
            quantity,
        )
        .await?;

        info!(order_id, "Market order recorded");
        Ok(())
    })
}
