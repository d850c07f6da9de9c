pub mod broker;
pub mod dhan;
pub mod quote_provider;
pub mod screener_source;
pub mod security_master;
pub mod yahoo;
