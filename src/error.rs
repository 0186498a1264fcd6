//! Engine-level error taxonomy

use thiserror::Error;

use crate::config::GridConfigError;
use crate::exchange::ExchangeError;
use crate::store::StoreError;

/// Errors surfaced by the grid engine, the reconciler and the order
/// operations built on top of them.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A referenced asset, user, strategy or order is missing from the store
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The exchange refused an order, e.g. a market order came back unfilled
    #[error("order not accepted by exchange: {0}")]
    ServiceUnavailable(String),

    /// The strategy configuration attached to a tradeflow is malformed
    #[error("invalid strategy config: {0}")]
    Config(#[from] GridConfigError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        // Missing rows map onto the NotFound taxonomy rather than a generic
        // storage failure.
        match err {
            StoreError::NotFound(what) => EngineError::NotFound(what),
            other => EngineError::Store(other),
        }
    }
}
