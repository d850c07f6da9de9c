use async_trait::async_trait;
use thiserror::Error;

use crate::models::{MarketSummary, StockProfile};

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("no price data available for {0}")]
    NoData(String),
}

/// Market data for NSE-listed stocks and indices.
///
/// Stock methods take the bare exchange trading symbol (e.g. `RELIANCE`);
/// index methods take the provider's index ticker (e.g. `^NSEI`).
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Latest traded price in the current session.
    async fn latest_price(&self, symbol: &str) -> Result<f64, QuoteError>;

    async fn index_summary(&self, index_symbol: &str) -> Result<MarketSummary, QuoteError>;

    async fn stock_profile(&self, symbol: &str) -> Result<StockProfile, QuoteError>;
}
