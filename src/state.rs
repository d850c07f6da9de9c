use std::sync::Arc;
use sqlx::PgPool;

use crate::external::broker::Broker;
use crate::external::quote_provider::QuoteProvider;
use crate::external::screener_source::ScreenerSource;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Collection of the configured trading mode.
    pub store: Arc<dyn RecordStore>,
    pub quotes: Arc<dyn QuoteProvider>,
    pub broker: Arc<dyn Broker>,
    pub screener_source: Arc<dyn ScreenerSource>,
}
