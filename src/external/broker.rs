use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("network error: {0}")]
    Network(String),

    #[error("broker API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("broker credentials are not configured")]
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductType {
    /// Cash-and-carry (delivery).
    Cnc,
}

/// Order as the trade lifecycle describes it; the broker adapter maps it
/// onto its own wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRequest {
    /// Carries the scan record id so orders can be traced back to it.
    pub correlation_id: String,
    pub security_id: String,
    pub exchange_segment: String,
    pub side: OrderSide,
    pub quantity: i64,
    pub order_type: OrderType,
    pub product_type: ProductType,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    pub order_id: String,
    pub order_status: String,
}

impl OrderAck {
    pub fn is_rejected(&self) -> bool {
        matches!(
            self.order_status.to_ascii_uppercase().as_str(),
            "REJECTED" | "FAILED" | "CANCELLED"
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub order_id: Option<String>,
    pub order_status: Option<String>,
    pub transaction_type: Option<String>,
    pub quantity: Option<i64>,
    pub filled_qty: Option<i64>,
    #[serde(default)]
    pub average_traded_price: f64,
    pub oms_error_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundLimits {
    pub dhan_client_id: Option<String>,
    #[serde(rename = "availabelBalance", alias = "availableBalance", default)]
    pub available_balance: f64,
    pub sod_limit: Option<f64>,
    pub collateral_amount: Option<f64>,
    pub receiveable_amount: Option<f64>,
    pub utilized_amount: Option<f64>,
    pub blocked_payout_amount: Option<f64>,
    pub withdrawable_balance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerPosition {
    pub dhan_client_id: Option<String>,
    pub trading_symbol: Option<String>,
    pub security_id: Option<String>,
    pub position_type: Option<String>,
    pub exchange_segment: Option<String>,
    pub product_type: Option<String>,
    pub buy_avg: Option<f64>,
    pub buy_qty: Option<i64>,
    pub cost_price: Option<f64>,
    pub sell_avg: Option<f64>,
    pub sell_qty: Option<i64>,
    pub net_qty: Option<i64>,
    pub realized_profit: Option<f64>,
    pub unrealized_profit: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub exchange: Option<String>,
    pub trading_symbol: Option<String>,
    pub security_id: Option<String>,
    pub isin: Option<String>,
    pub total_qty: Option<i64>,
    pub dp_qty: Option<i64>,
    pub t1_qty: Option<i64>,
    pub available_qty: Option<i64>,
    pub collateral_qty: Option<i64>,
    pub avg_cost_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeHistoryEntry {
    pub order_id: Option<String>,
    pub exchange_trade_id: Option<String>,
    pub transaction_type: Option<String>,
    pub traded_quantity: Option<i64>,
    pub traded_price: Option<f64>,
    pub custom_symbol: Option<String>,
    pub instrument: Option<String>,
    pub sebi_tax: Option<f64>,
    pub stt: Option<f64>,
    pub brokerage_charges: Option<f64>,
    pub service_tax: Option<f64>,
    pub exchange_transaction_charges: Option<f64>,
    pub stamp_duty: Option<f64>,
    pub exchange_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeBookEntry {
    pub order_id: Option<String>,
    pub exchange_trade_id: Option<String>,
    pub traded_quantity: Option<i64>,
    pub traded_price: Option<f64>,
    pub transaction_type: Option<String>,
    pub trading_symbol: Option<String>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
    pub exchange_time: Option<String>,
}

/// Brokerage account and order gateway.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn fund_limits(&self) -> Result<FundLimits, BrokerError>;

    async fn positions(&self) -> Result<Vec<BrokerPosition>, BrokerError>;

    async fn holdings(&self) -> Result<Vec<Holding>, BrokerError>;

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError>;

    async fn order_by_id(&self, order_id: &str) -> Result<OrderDetail, BrokerError>;

    async fn trade_history(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        page: u32,
    ) -> Result<Vec<TradeHistoryEntry>, BrokerError>;

    async fn trade_book(&self) -> Result<Vec<TradeBookEntry>, BrokerError>;
}
