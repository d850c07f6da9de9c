use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{MarketOverview, StockDetail};
use crate::state::AppState;

pub const NIFTY_50: &str = "^NSEI";
pub const SENSEX: &str = "^BSESN";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/market-summary", get(get_market_summary))
        .route("/stock-detail", post(get_stock_detail))
}

pub async fn get_market_summary(
    State(state): State<AppState>
) -> Result<Json<MarketOverview>, AppError> {
    info!("GET /market/market-summary - Fetching Nifty 50 and Sensex");
    let (nifty_50, sensex) = tokio::try_join!(
        state.quotes.index_summary(NIFTY_50),
        state.quotes.index_summary(SENSEX),
    )
        .map_err(|e| {
            error!("Failed to fetch market summary: {}", e);
            e
        })?;
    Ok(Json(MarketOverview { nifty_50, sensex }))
}

#[derive(Debug, Deserialize)]
pub struct StockDetailParams {
    pub index_symbol: String,
}

pub async fn get_stock_detail(
    State(state): State<AppState>,
    Query(params): Query<StockDetailParams>,
) -> Result<Json<StockDetail>, AppError> {
    let symbol = params.index_symbol.trim().to_uppercase();
    info!("POST /market/stock-detail - {}", symbol);

    if symbol.is_empty() {
        return Err(AppError::Validation("index_symbol is required".to_string()));
    }

    let profile = state.quotes.stock_profile(&symbol).await
        .map_err(|e| {
            error!("Failed to fetch profile for {}: {}", symbol, e);
            e
        })?;

    let detail = StockDetail::from_profile(&symbol, profile).ok_or_else(|| {
        warn!("No market cap reported for {}", symbol);
        AppError::NotFound("Market cap not available for the given symbol".to_string())
    })?;
    Ok(Json(detail))
}
