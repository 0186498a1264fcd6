//! Bulk cancellation command

use anyhow::Result;
use tracing::info;

use tharseo::engine::cancel_open_orders;

pub fn run(config_path: String, user_id: i64) -> Result<()> {
    dotenv::dotenv().ok();

    let runtime = super::build_runtime()?;
    runtime.block_on(async {
        let components = super::build(&config_path)?;

        let cancelled = cancel_open_orders(
            &*components.exchange,
            &*components.store,
            user_id,
            &components.config.engine.quote_symbol,
        )
        .await?;

        info!(user_id, cancelled, "Bulk cancellation finished");
        Ok(())
    })
}
