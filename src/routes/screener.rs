use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::StoredScanRecord;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stocks", get(get_screener_stocks))
}

/// Every daily pick of the active collection, newest date first.
pub async fn get_screener_stocks(
    State(state): State<AppState>
) -> Result<Json<Vec<StoredScanRecord>>, AppError> {
    info!("GET /screener/stocks - Fetching {}", state.store.collection().table_name());
    let records = state.store.find_all().await
        .map_err(|e| {
            error!("Failed to fetch screener records: {}", e);
            e
        })?;
    Ok(Json(records))
}
