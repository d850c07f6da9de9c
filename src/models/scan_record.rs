use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of a daily pick. Only ever moves forward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Scanned,
    Bought,
    Sold,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Scanned => "scanned",
            TradeStatus::Bought => "bought",
            TradeStatus::Sold => "sold",
        }
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived flag: `active` exactly while the position is held.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PositionState {
    Active,
    Inactive,
}

impl From<TradeStatus> for PositionState {
    fn from(status: TradeStatus) -> Self {
        match status {
            TradeStatus::Bought => PositionState::Active,
            _ => PositionState::Inactive,
        }
    }
}

impl std::fmt::Display for PositionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionState::Active => write!(f, "active"),
            PositionState::Inactive => write!(f, "inactive"),
        }
    }
}

/// Which side of the lifecycle a scheduled trade run performs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    /// Status a record must hold for this action to pick it up.
    pub fn required_status(self) -> TradeStatus {
        match self {
            TradeAction::Buy => TradeStatus::Scanned,
            TradeAction::Sell => TradeStatus::Bought,
        }
    }

    pub fn resulting_status(self) -> TradeStatus {
        match self {
            TradeAction::Buy => TradeStatus::Bought,
            TradeAction::Sell => TradeStatus::Sold,
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

impl std::str::FromStr for TradeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            other => Err(format!("Invalid trade action: {}", other)),
        }
    }
}

/// The day's pick from the screener and everything the trade lifecycle
/// writes back onto it. One per calendar date (Asia/Kolkata).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct ScanRecord {
    pub id: String,
    pub stock_name: Option<String>,
    pub symbol: String,
    pub security_id: Option<String>,
    pub change: f64,
    pub price: Option<String>,
    pub volume: Option<String>,
    pub quantity: i64,
    pub buy_price: f64,
    pub sell_price: f64,
    pub status: TradeStatus,
    pub state: PositionState,
    pub date: NaiveDate,
}

impl ScanRecord {
    pub fn scanned(
        stock_name: Option<String>,
        symbol: String,
        security_id: Option<String>,
        change: f64,
        price: Option<String>,
        volume: Option<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: short_id(),
            stock_name,
            symbol,
            security_id,
            change,
            price,
            volume,
            quantity: 0,
            buy_price: 0.0,
            sell_price: 0.0,
            status: TradeStatus::Scanned,
            state: PositionState::Inactive,
            date,
        }
    }
}

/// A record together with its storage identity.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StoredScanRecord {
    #[serde(rename = "_id")]
    pub pk: i64,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub record: ScanRecord,
}

/// Fields a successful trade writes onto a record.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeFill {
    pub status: TradeStatus,
    pub quantity: i64,
    pub price: f64,
}

impl TradeFill {
    pub fn state(&self) -> PositionState {
        PositionState::from(self.status)
    }

    /// Applies the fill to a record in place.
    pub fn apply(&self, record: &mut ScanRecord) {
        record.status = self.status;
        record.state = self.state();
        record.quantity = self.quantity;
        match self.status {
            TradeStatus::Bought => record.buy_price = self.price,
            TradeStatus::Sold => record.sell_price = self.price,
            TradeStatus::Scanned => {}
        }
    }
}

// Eight hex chars of a v4 uuid.
fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
