use crate::config::SchedulerConfig;
use crate::db::job_run_queries;
use crate::errors::AppError;
use crate::jobs::{daily_scan_job, trade_job};
use crate::market_time::MARKET_TZ;
use crate::services::screener_service::ScreenerCollector;
use crate::services::trade_service::TradeLifecycle;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub pool: Arc<PgPool>,
    pub screener: Arc<ScreenerCollector>,
    pub trader: Arc<TradeLifecycle>,
}

#[derive(Debug)]
pub struct JobResult {
    pub items_processed: i32,
    pub outcome: &'static str,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, context })
    }

    /// Registers the scan, buy and sell jobs and starts the scheduler.
    pub async fn start(&mut self, config: &SchedulerConfig) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler (timezone {})...", MARKET_TZ);

        // Format: sec min hour day month weekday
        self.schedule_job(
            &config.scan_cron,
            "daily_scan",
            daily_scan_job::run_daily_scan,
        ).await?;

        self.schedule_job(
            &config.buy_cron,
            "buy_stock",
            trade_job::run_buy,
        ).await?;

        self.schedule_job(
            &config.sell_cron,
            "sell_stock",
            trade_job::run_sell,
        ).await?;

        self.scheduler.start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started with 3 jobs");
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler.shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async_tz(schedule, MARKET_TZ, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job_with_tracking(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler.add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} [cron: {} {}]", job_name, schedule, MARKET_TZ);
        Ok(())
    }
}

// Runs one job and records it in job_runs. Nothing escapes to the scheduler.
async fn execute_job_with_tracking<F, Fut>(
    job_name: &str,
    context: JobContext,
    job_fn: Arc<F>,
) where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();
    let pool = context.pool.clone();

    // A tracking failure is logged but does not stop the job itself.
    let job_id = match job_run_queries::record_start(&pool, job_name).await {
        Ok(id) => Some(id),
        Err(e) => {
            error!("Failed to record job start for {}: {}", job_name, e);
            None
        }
    };

    let result = job_fn(context).await;
    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => {
            info!(
                "✅ Job completed: {} (outcome: {}, processed: {}, duration: {}ms)",
                job_name, job_result.outcome, job_result.items_processed, duration_ms
            );

            if let Some(job_id) = job_id {
                if let Err(e) = job_run_queries::record_success(
                    &pool,
                    job_id,
                    job_result.outcome,
                    job_result.items_processed,
                    duration_ms,
                ).await {
                    error!("Failed to record job success: {}", e);
                }
            }
        }
        Err(e) => {
            error!("❌ Job failed: {} - {}", job_name, e);

            if let Some(job_id) = job_id {
                if let Err(e) = job_run_queries::record_failure(&pool, job_id, &e.to_string(), duration_ms).await {
                    error!("Failed to record job failure: {}", e);
                }
            }
        }
    }
}
