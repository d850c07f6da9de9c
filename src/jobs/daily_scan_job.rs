//! Daily screener scan.
//!
//! Runs every night at 23:59 Asia/Kolkata (`SCAN_CRON`). Fetches the
//! screener table, keeps the top mover and upserts it as the record for
//! the current market date.
//!
//! The buy job only picks up a record dated on its own day. With the
//! default schedules the 23:59 pick is dated the day whose 15:16 buy has
//! already run, so the next session's buy does not see it. Moving
//! `SCAN_CRON` before `BUY_CRON` on the same day is what lets a pick be
//! bought.

use crate::errors::AppError;
use crate::market_time::market_today;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use crate::services::screener_service::ScanOutcome;
use tracing::{info, warn};

pub async fn run_daily_scan(ctx: JobContext) -> Result<JobResult, AppError> {
    let today = market_today();
    info!("🔎 Starting daily scan for {}", today);

    let outcome = ctx.screener.collect(today).await?;
    Ok(scan_result(&outcome))
}

fn scan_result(outcome: &ScanOutcome) -> JobResult {
    match outcome {
        ScanOutcome::Stored { record, .. } => {
            info!("Today's pick: {} ({:+.2}%)", record.record.symbol, record.record.change);
            JobResult { items_processed: 1, outcome: outcome.label() }
        }
        ScanOutcome::NoRows | ScanOutcome::NoCandidates => {
            warn!("Daily scan stored nothing: {}", outcome.label());
            JobResult { items_processed: 0, outcome: outcome.label() }
        }
    }
}
