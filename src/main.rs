use anyhow::{anyhow, Context};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use stockfolio_backend::app;
use stockfolio_backend::config::AppConfig;
use stockfolio_backend::external::broker::Broker;
use stockfolio_backend::external::dhan::DhanClient;
use stockfolio_backend::external::quote_provider::QuoteProvider;
use stockfolio_backend::external::screener_source::{HtmlTableScraper, ScreenerSource};
use stockfolio_backend::external::security_master::SecurityMaster;
use stockfolio_backend::external::yahoo::YahooProvider;
use stockfolio_backend::logging::{self, LoggingConfig};
use stockfolio_backend::services::job_scheduler_service::{JobContext, JobSchedulerService};
use stockfolio_backend::services::screener_service::ScreenerCollector;
use stockfolio_backend::services::trade_service::TradeLifecycle;
use stockfolio_backend::state::AppState;
use stockfolio_backend::store::{PgRecordStore, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to DATABASE_URL")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let collection = config.trading.mode.collection();
    info!("💹 Trading mode: {} (collection {})", config.trading.mode, collection.table_name());

    let store: Arc<dyn RecordStore> = Arc::new(PgRecordStore::new(pool.clone(), collection));
    let quotes: Arc<dyn QuoteProvider> = Arc::new(YahooProvider::new()?);
    let broker: Arc<dyn Broker> = Arc::new(DhanClient::new(&config.dhan)?);
    let screener_source: Arc<dyn ScreenerSource> = Arc::new(HtmlTableScraper::new(&config.screener)?);

    if config.trading.mode.is_live() && (config.dhan.client_id.is_none() || config.dhan.access_token.is_none()) {
        warn!("TRADING_MODE is live but DHAN_CLIENT_ID / DHAN_ACCESS_TOKEN are not set; orders will fail");
    }

    let master = Arc::new(SecurityMaster::load(&config.screener.security_master_path));
    if master.is_empty() && config.trading.mode.is_live() {
        warn!("Security master is empty; live orders will carry no security id");
    }
    let collector = Arc::new(ScreenerCollector::new(
        screener_source.clone(),
        master,
        store.clone(),
        config.screener.url.clone(),
        config.screener.table_id.clone(),
    ));
    let trader = Arc::new(TradeLifecycle::new(
        store.clone(),
        quotes.clone(),
        broker.clone(),
        config.trading.clone(),
    ));

    let mut scheduler = JobSchedulerService::new(JobContext {
        pool: Arc::new(pool.clone()),
        screener: collector,
        trader,
    })
    .await?;
    scheduler.start(&config.scheduler).await?;

    let state = AppState {
        pool,
        store,
        quotes,
        broker,
        screener_source,
    };
    let app = app::create_app(state, &config.client_urls);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🚀 {} backend running at http://{}/", config.app_name, config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
