//! Stockfolio backend.
//!
//! Nightly screener scan, next-session buy and sell of the day's pick,
//! plus brokerage and market-data pass-through routes. The binary in
//! `main.rs` wires these modules together and serves the router.

pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod external;
pub mod jobs;
pub mod logging;
pub mod market_time;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
#[cfg(test)]
mod test_support;
