pub mod health;
pub mod market;
pub mod portfolio;
pub mod root;
pub mod scrape;
pub mod screener;
