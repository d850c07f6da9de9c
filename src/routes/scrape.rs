use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::screener_source::{is_empty_scan, ScreenerRow};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/table", post(scrape_table))
}

#[derive(Debug, Deserialize)]
pub struct ScrapingRequest {
    pub url: String,
    pub table_id: String,
}

#[derive(Debug, Serialize)]
pub struct ScrapingResponse {
    pub data: Vec<ScreenerRow>,
}

pub async fn scrape_table(
    State(state): State<AppState>,
    Json(req): Json<ScrapingRequest>,
) -> Result<Json<ScrapingResponse>, AppError> {
    info!("POST /scrape/table - {} #{}", req.url, req.table_id);

    if req.url.trim().is_empty() || req.table_id.trim().is_empty() {
        return Err(AppError::Validation("url and table_id are required".to_string()));
    }

    let rows = state.screener_source.fetch_table(&req.url, &req.table_id).await
        .map_err(|e| {
            error!("Failed to scrape table {} from {}: {}", req.table_id, req.url, e);
            AppError::from(e)
        })?;

    if is_empty_scan(&rows) {
        warn!("No valid stock data available to process.");
        return Ok(Json(ScrapingResponse { data: Vec::new() }));
    }
    Ok(Json(ScrapingResponse { data: rows }))
}
