pub mod job_scheduler_service;
pub mod screener_service;
pub mod trade_service;
