//! Bulk cancellation of a user's open orders

use tracing::{info, warn};

use crate::error::EngineError;
use crate::exchange::ExchangeClient;
use crate::store::OrderStore;

/// Cancel all of a user's open orders across every symbol with a pending
/// position, then mark the rows CANCELADO.
///
/// The exchange-side cancels and the database update are two independent
/// steps with no shared transaction. A crash between them leaves rows
/// PENDENTE for orders already cancelled on the exchange; that hazard is
/// documented, not auto-reconciled.
pub async fn cancel_open_orders(
    exchange: &dyn ExchangeClient,
    store: &dyn OrderStore,
    user_id: i64,
    quote_symbol: &str,
) -> Result<u64, EngineError> {
    info!(user_id, "Bulk cancellation requested");

    let credential = store.user_credential(user_id)?;
    let symbols = store.distinct_pending_symbols(user_id, quote_symbol)?;

    for symbol in &symbols {
        if let Err(err) = exchange.cancel_open_orders(&credential, symbol).await {
            // Remaining symbols are still attempted; the final status update
            // runs regardless of individual cancel outcomes
            warn!(symbol = %symbol, "Exchange cancel failed: {err}");
        }
    }

    let cancelled = store.bulk_cancel(user_id)?;
    info!(user_id, cancelled, "Open orders cancelled");
    Ok(cancelled)
}
