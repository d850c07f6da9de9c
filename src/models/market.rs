use serde::{Deserialize, Serialize};

const LARGE_CAP_THRESHOLD: f64 = 20000.0 * 1e7;
const MID_CAP_THRESHOLD: f64 = 5000.0 * 1e7;
const CRORE: f64 = 1e7;

/// Latest session of an index, with the close of the session before it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketSummary {
    pub index_name: String,
    pub current_price: f64,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub previous_close: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOverview {
    pub nifty_50: MarketSummary,
    pub sensex: MarketSummary,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CapCategory {
    #[serde(rename = "Large-Cap")]
    LargeCap,
    #[serde(rename = "Mid-Cap")]
    MidCap,
    #[serde(rename = "Small-Cap")]
    SmallCap,
}

impl CapCategory {
    /// Buckets a market cap given in rupees.
    pub fn from_market_cap(market_cap: f64) -> Self {
        if market_cap > LARGE_CAP_THRESHOLD {
            CapCategory::LargeCap
        } else if market_cap >= MID_CAP_THRESHOLD {
            CapCategory::MidCap
        } else {
            CapCategory::SmallCap
        }
    }
}

/// Raw company profile as reported by the market data provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockProfile {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub trailing_pe: Option<f64>,
    pub previous_close: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub current_price: Option<f64>,
    pub open: Option<f64>,
    pub volume: Option<i64>,
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StockDetail {
    pub ticker: String,
    pub stock_name: String,
    pub market_cap_crores: f64,
    pub sector: String,
    pub industry: String,
    pub pe_ratio: Option<f64>,
    pub previous_close: Option<f64>,
    #[serde(rename = "52_week_range")]
    pub week_52_range: String,
    pub current_price: Option<f64>,
    pub open_price: Option<f64>,
    pub volume: Option<i64>,
    pub percent_change: Option<f64>,
    pub market_cap: f64,
    pub category: CapCategory,
}

impl StockDetail {
    /// Builds the detail view; `None` when the provider reports no market cap.
    pub fn from_profile(ticker: &str, profile: StockProfile) -> Option<Self> {
        let market_cap = profile.market_cap?;

        let percent_change = match (profile.current_price, profile.previous_close) {
            (Some(current), Some(previous)) if previous != 0.0 => {
                Some(round2((current - previous) / previous * 100.0))
            }
            _ => None,
        };

        Some(Self {
            ticker: ticker.to_string(),
            stock_name: profile
                .long_name
                .unwrap_or_else(|| "Unknown Stock Name".to_string()),
            market_cap_crores: round2(market_cap / CRORE),
            sector: profile.sector.unwrap_or_else(|| "Unknown Sector".to_string()),
            industry: profile
                .industry
                .unwrap_or_else(|| "Unknown Industry".to_string()),
            pe_ratio: profile.trailing_pe,
            previous_close: profile.previous_close,
            week_52_range: format!(
                "{} - {}",
                fmt_opt(profile.fifty_two_week_low),
                fmt_opt(profile.fifty_two_week_high)
            ),
            current_price: profile.current_price,
            open_price: profile.open,
            volume: profile.volume,
            percent_change,
            market_cap,
            category: CapCategory::from_market_cap(market_cap),
        })
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}
