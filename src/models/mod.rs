mod scan_record;
mod market;

pub use scan_record::{
    PositionState, ScanRecord, StoredScanRecord, TradeAction, TradeFill, TradeStatus,
};
pub use market::{round2, CapCategory, MarketOverview, MarketSummary, StockDetail, StockProfile};
