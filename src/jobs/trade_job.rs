//! Scheduled buy and sell runs.
//!
//! - **Buy**: 15:16:05 Asia/Kolkata on weekdays (`BUY_CRON`), shortly
//!   before the close, for the record scanned for today.
//! - **Sell**: 09:16:05 Asia/Kolkata on weekdays (`SELL_CRON`), right after
//!   the open, for whichever position is currently held.

use crate::errors::AppError;
use crate::market_time::market_today;
use crate::models::TradeAction;
use crate::services::job_scheduler_service::{JobContext, JobResult};
use crate::services::trade_service::TradeOutcome;

pub async fn run_buy(ctx: JobContext) -> Result<JobResult, AppError> {
    run_trade(ctx, TradeAction::Buy).await
}

pub async fn run_sell(ctx: JobContext) -> Result<JobResult, AppError> {
    run_trade(ctx, TradeAction::Sell).await
}

async fn run_trade(ctx: JobContext, action: TradeAction) -> Result<JobResult, AppError> {
    let outcome = ctx.trader.execute(action, market_today()).await?;
    Ok(trade_result(&outcome))
}

fn trade_result(outcome: &TradeOutcome) -> JobResult {
    JobResult {
        items_processed: i32::from(outcome.changed_store()),
        outcome: outcome.label(),
    }
}
