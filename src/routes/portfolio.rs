use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;
use crate::external::broker::{BrokerPosition, FundLimits, Holding, TradeBookEntry, TradeHistoryEntry};
use crate::market_time::market_today;
use crate::state::AppState;

/// Days covered by the trade history when no range is given, today included.
const DEFAULT_HISTORY_DAYS: i64 = 7;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/get_fund_limits", get(get_fund_limits))
        .route("/get_positions", get(get_positions))
        .route("/get_holdings", get(get_holdings))
        .route("/trade_history", get(get_trade_history))
}

pub async fn get_fund_limits(
    State(state): State<AppState>
) -> Result<Json<FundLimits>, AppError> {
    info!("GET /portfolio/get_fund_limits");
    let limits = state.broker.fund_limits().await
        .map_err(|e| {
            error!("Failed to fetch fund limits: {}", e);
            e
        })?;
    Ok(Json(limits))
}

pub async fn get_positions(
    State(state): State<AppState>
) -> Result<Json<Vec<BrokerPosition>>, AppError> {
    info!("GET /portfolio/get_positions");
    let positions = state.broker.positions().await
        .map_err(|e| {
            error!("Failed to fetch positions: {}", e);
            e
        })?;
    Ok(Json(positions))
}

pub async fn get_holdings(
    State(state): State<AppState>
) -> Result<Json<Vec<Holding>>, AppError> {
    info!("GET /portfolio/get_holdings");
    let holdings = state.broker.holdings().await
        .map_err(|e| {
            error!("Failed to fetch holdings: {}", e);
            e
        })?;
    Ok(Json(holdings))
}

#[derive(Debug, Default, Deserialize)]
pub struct TradeHistoryParams {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedTrades {
    pub trade_history: Vec<TradeHistoryEntry>,
    pub trade_book: Vec<TradeBookEntry>,
}

/// Resolves the requested range; a missing end is `today` and a missing
/// start is the week ending at the end date.
pub fn history_range(params: &TradeHistoryParams, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AppError> {
    let to = params.to_date.unwrap_or(today);
    let from = params
        .from_date
        .unwrap_or_else(|| to - Duration::days(DEFAULT_HISTORY_DAYS - 1));

    if from > to {
        return Err(AppError::Validation(format!(
            "from_date {} is after to_date {}",
            from, to
        )));
    }
    Ok((from, to))
}

pub async fn get_trade_history(
    State(state): State<AppState>,
    Query(params): Query<TradeHistoryParams>,
) -> Result<Json<CombinedTrades>, AppError> {
    let (from, to) = history_range(&params, market_today())?;
    info!("GET /portfolio/trade_history - {} to {}", from, to);

    let (trade_history, trade_book) = tokio::try_join!(
        state.broker.trade_history(from, to, params.page.unwrap_or(0)),
        state.broker.trade_book(),
    )
        .map_err(|e| {
            error!("An error occurred while fetching trades: {}", e);
            e
        })?;

    Ok(Json(CombinedTrades { trade_history, trade_book }))
}
