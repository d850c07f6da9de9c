//! In-crate fakes for the external collaborators.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::external::broker::{
    Broker, BrokerError, BrokerPosition, FundLimits, Holding, OrderAck, OrderDetail,
    OrderRequest, TradeBookEntry, TradeHistoryEntry,
};
use crate::external::quote_provider::{QuoteError, QuoteProvider};
use crate::external::screener_source::{ScrapeError, ScreenerRow, ScreenerSource};
use crate::models::{MarketSummary, StockProfile};

/// Quotes every symbol at one price; `None` behaves like a day with no data.
#[derive(Default)]
pub struct StubQuotes {
    pub price: Option<f64>,
    pub profile: Option<StockProfile>,
}

impl StubQuotes {
    pub fn priced(price: f64) -> Self {
        Self { price: Some(price), profile: None }
    }
}

#[async_trait]
impl QuoteProvider for StubQuotes {
    async fn latest_price(&self, symbol: &str) -> Result<f64, QuoteError> {
        self.price.ok_or_else(|| QuoteError::NoData(symbol.to_string()))
    }

    async fn index_summary(&self, index_symbol: &str) -> Result<MarketSummary, QuoteError> {
        let close = self.price.ok_or_else(|| QuoteError::NoData(index_symbol.to_string()))?;
        Ok(MarketSummary {
            index_name: index_symbol.to_string(),
            current_price: close,
            open_price: close,
            high_price: close,
            low_price: close,
            previous_close: close,
            volume: 0,
        })
    }

    async fn stock_profile(&self, symbol: &str) -> Result<StockProfile, QuoteError> {
        self.profile
            .clone()
            .ok_or_else(|| QuoteError::NoData(symbol.to_string()))
    }
}

/// Broker with a fixed balance and fill price that remembers its orders.
pub struct ScriptedBroker {
    pub balance: f64,
    pub average_price: f64,
    pub reject: bool,
    orders: Mutex<Vec<OrderRequest>>,
}

impl ScriptedBroker {
    pub fn new(balance: f64, average_price: f64) -> Self {
        Self { balance, average_price, reject: false, orders: Mutex::new(Vec::new()) }
    }

    pub fn rejecting() -> Self {
        Self { reject: true, ..Self::new(84_000.0, 2000.0) }
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().clone()
    }
}

#[async_trait]
impl Broker for ScriptedBroker {
    async fn fund_limits(&self) -> Result<FundLimits, BrokerError> {
        Ok(FundLimits { available_balance: self.balance, ..Default::default() })
    }

    async fn positions(&self) -> Result<Vec<BrokerPosition>, BrokerError> {
        Ok(vec![BrokerPosition {
            trading_symbol: Some("ACME".into()),
            net_qty: Some(20),
            ..Default::default()
        }])
    }

    async fn holdings(&self) -> Result<Vec<Holding>, BrokerError> {
        Ok(vec![])
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        if self.reject {
            return Err(BrokerError::Rejected("order 1001 is REJECTED".into()));
        }
        self.orders.lock().push(order.clone());
        Ok(OrderAck { order_id: "1001".into(), order_status: "TRANSIT".into() })
    }

    async fn order_by_id(&self, order_id: &str) -> Result<OrderDetail, BrokerError> {
        Ok(OrderDetail {
            order_id: Some(order_id.to_string()),
            average_traded_price: self.average_price,
            ..Default::default()
        })
    }

    async fn trade_history(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        _page: u32,
    ) -> Result<Vec<TradeHistoryEntry>, BrokerError> {
        Ok(vec![TradeHistoryEntry {
            custom_symbol: Some(format!("{from}..{to}")),
            ..Default::default()
        }])
    }

    async fn trade_book(&self) -> Result<Vec<TradeBookEntry>, BrokerError> {
        Ok(vec![])
    }
}

/// Screener that always returns the same rows, or fails when `rows` is `None`.
pub struct CannedSource {
    pub rows: Option<Vec<ScreenerRow>>,
}

impl CannedSource {
    pub fn new(rows: Vec<ScreenerRow>) -> Self {
        Self { rows: Some(rows) }
    }

    pub fn failing() -> Self {
        Self { rows: None }
    }
}

#[async_trait]
impl ScreenerSource for CannedSource {
    async fn fetch_table(&self, _url: &str, _table_id: &str) -> Result<Vec<ScreenerRow>, ScrapeError> {
        self.rows
            .clone()
            .ok_or_else(|| ScrapeError::Network("connection reset".into()))
    }
}
