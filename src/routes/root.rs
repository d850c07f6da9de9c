use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::db::scan_record_queries;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/testdb", get(test_db))
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Stock Portfolio App" }))
}

/// Reports whether the database answers; failures come back as the error text.
async fn test_db(State(state): State<AppState>) -> Json<String> {
    info!("GET /testdb - Checking database connection");
    match scan_record_queries::ping(&state.pool).await {
        Ok(()) => Json("Connected".to_string()),
        Err(e) => {
            error!("Database ping failed: {}", e);
            Json(e.to_string())
        }
    }
}
