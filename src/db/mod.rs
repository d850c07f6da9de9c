pub mod job_run_queries;
pub mod scan_record_queries;
