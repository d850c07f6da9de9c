use crate::external::quote_provider::{QuoteError, QuoteProvider};
use crate::models::{round2, MarketSummary, StockProfile};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stockfolio-backend/0.1";

pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new() -> Result<Self, QuoteError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| QuoteError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    async fn fetch_chart(
        &self,
        ticker: &str,
        range: &str,
        interval: &str,
    ) -> Result<ChartResult, QuoteError> {
        let url = format!("{CHART_URL}/{ticker}");
        debug!("GET {} range={} interval={}", url, range, interval);

        let resp = self.client
            .get(url)
            .query(&[("range", range), ("interval", interval)])
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(QuoteError::RateLimited);
        }

        let body = resp
            .json::<ChartResponse>()
            .await
            .map_err(|e| QuoteError::Parse(e.to_string()))?;

        body.chart.result
            .and_then(|mut r| r.pop())
            .ok_or_else(|| QuoteError::NoData(ticker.to_string()))
    }
}

/// Yahoo lists NSE equities with a `.NS` suffix.
pub fn nse_ticker(symbol: &str) -> String {
    format!("{}.NS", symbol.trim().to_uppercase())
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl ChartResult {
    fn bars(&self) -> Vec<Bar> {
        let Some(q) = self.indicators.quote.first() else { return vec![] };
        let at = |v: &Vec<Option<f64>>, i: usize| v.get(i).copied().flatten();

        (0..self.timestamp.len().max(q.close.len()))
            .filter_map(|i| {
                let close = at(&q.close, i)?;
                Some(Bar {
                    open: at(&q.open, i).unwrap_or(close),
                    high: at(&q.high, i).unwrap_or(close),
                    low: at(&q.low, i).unwrap_or(close),
                    close,
                    volume: q.volume.get(i).copied().flatten().unwrap_or(0),
                })
            })
            .collect()
    }
}

/// Latest bar plus the previous bar's close, or the latest close when the
/// range only holds one bar.
pub fn summarize_bars(index_name: &str, bars: &[Bar]) -> Option<MarketSummary> {
    let latest = bars.last()?;
    let current_price = round2(latest.close);
    let previous_close = bars
        .len()
        .checked_sub(2)
        .and_then(|i| bars.get(i))
        .map(|b| round2(b.close))
        .unwrap_or(current_price);

    Some(MarketSummary {
        index_name: index_name.to_string(),
        current_price,
        open_price: round2(latest.open),
        high_price: round2(latest.high),
        low_price: round2(latest.low),
        previous_close,
        volume: latest.volume,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    price: PriceModule,
    #[serde(default)]
    summary_detail: SummaryDetailModule,
    #[serde(default)]
    asset_profile: AssetProfileModule,
}

#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(v: &Option<RawValue>) -> Option<f64> {
    v.as_ref().and_then(|v| v.raw)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    regular_market_price: Option<RawValue>,
    regular_market_open: Option<RawValue>,
    regular_market_volume: Option<RawValue>,
    regular_market_previous_close: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetailModule {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    previous_close: Option<RawValue>,
    fifty_two_week_low: Option<RawValue>,
    fifty_two_week_high: Option<RawValue>,
    open: Option<RawValue>,
    volume: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfileModule {
    sector: Option<String>,
    industry: Option<String>,
}

impl From<QuoteSummaryResult> for StockProfile {
    fn from(r: QuoteSummaryResult) -> Self {
        let (p, d) = (&r.price, &r.summary_detail);
        StockProfile {
            long_name: p.long_name.clone(),
            sector: r.asset_profile.sector,
            industry: r.asset_profile.industry,
            trailing_pe: raw(&d.trailing_pe),
            previous_close: raw(&d.previous_close).or(raw(&p.regular_market_previous_close)),
            fifty_two_week_low: raw(&d.fifty_two_week_low),
            fifty_two_week_high: raw(&d.fifty_two_week_high),
            current_price: raw(&p.regular_market_price),
            open: raw(&d.open).or(raw(&p.regular_market_open)),
            volume: raw(&d.volume)
                .or(raw(&p.regular_market_volume))
                .map(|v| v as i64),
            market_cap: raw(&p.market_cap).or(raw(&d.market_cap)),
        }
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    async fn latest_price(&self, symbol: &str) -> Result<f64, QuoteError> {
        let ticker = nse_ticker(symbol);
        let chart = self.fetch_chart(&ticker, "1d", "1m").await?;
        chart
            .bars()
            .last()
            .map(|b| b.close)
            .ok_or(QuoteError::NoData(ticker))
    }

    async fn index_summary(&self, index_symbol: &str) -> Result<MarketSummary, QuoteError> {
        let chart = self.fetch_chart(index_symbol, "5d", "1d").await?;
        summarize_bars(index_symbol, &chart.bars())
            .ok_or_else(|| QuoteError::NoData(index_symbol.to_string()))
    }

    async fn stock_profile(&self, symbol: &str) -> Result<StockProfile, QuoteError> {
        let ticker = nse_ticker(symbol);
        let url = format!("{QUOTE_SUMMARY_URL}/{ticker}");

        let resp = self.client
            .get(url)
            .query(&[("modules", "price,summaryDetail,assetProfile")])
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(QuoteError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(QuoteError::BadResponse(format!("HTTP {}", resp.status())));
        }

        let body = resp
            .json::<QuoteSummaryResponse>()
            .await
            .map_err(|e| QuoteError::Parse(e.to_string()))?;

        body.quote_summary.result
            .and_then(|mut r| r.pop())
            .map(StockProfile::from)
            .ok_or(QuoteError::NoData(ticker))
    }
}
