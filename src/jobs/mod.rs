//! Scheduled jobs.
//!
//! - `daily_scan_job` - scrapes the screener and stores the day's pick
//! - `trade_job` - buys the day's pick and sells the held position
//!
//! Each job returns a `JobResult` describing its outcome. Errors are
//! reported to the scheduler wrapper, which logs and records them.

pub mod daily_scan_job;
pub mod trade_job;
