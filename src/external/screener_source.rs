use crate::config::ScreenerConfig;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// One table row keyed by column header.
pub type ScreenerRow = BTreeMap<String, String>;

/// Header of the row number column; the screener puts its "nothing
/// matched" banner there.
pub const SERIAL_COLUMN: &str = "Sr.";
pub const NO_RESULTS_SENTINEL: &str = "No stocks filtered in the Scan";

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {0} from screener")]
    Http(u16),

    #[error("Table with ID '{0}' not found on the page.")]
    TableNotFound(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Source of today's screener rows.
#[async_trait]
pub trait ScreenerSource: Send + Sync {
    /// Rows of table `table_id` on `url`. An empty vector is a normal
    /// "nothing matched today" answer.
    async fn fetch_table(&self, url: &str, table_id: &str) -> Result<Vec<ScreenerRow>, ScrapeError>;
}

/// True when the rows carry no candidates: nothing at all, or only the
/// screener's "no stocks filtered" banner row.
pub fn is_empty_scan(rows: &[ScreenerRow]) -> bool {
    match rows {
        [] => true,
        [only] => only.get(SERIAL_COLUMN).map(String::as_str) == Some(NO_RESULTS_SENTINEL),
        _ => false,
    }
}

/// Extracts `table#<table_id>` as header → cell mappings.
pub fn parse_table(html: &str, table_id: &str) -> Result<Vec<ScreenerRow>, ScrapeError> {
    let doc = Html::parse_document(html);

    let table_sel = Selector::parse(&format!("table[id=\"{}\"]", table_id))
        .map_err(|e| ScrapeError::Parse(format!("table selector: {:?}", e)))?;
    let th_sel = Selector::parse("thead th")
        .map_err(|e| ScrapeError::Parse(format!("th selector: {:?}", e)))?;
    let tr_sel = Selector::parse("tbody tr")
        .map_err(|e| ScrapeError::Parse(format!("row selector: {:?}", e)))?;
    let td_sel = Selector::parse("td")
        .map_err(|e| ScrapeError::Parse(format!("td selector: {:?}", e)))?;

    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| ScrapeError::TableNotFound(table_id.to_string()))?;

    let headers: Vec<String> = table
        .select(&th_sel)
        .map(|th| th.text().collect::<String>().trim().to_string())
        .collect();

    let rows = table
        .select(&tr_sel)
        .map(|tr| {
            tr.select(&td_sel)
                .zip(headers.iter())
                .map(|(td, header)| {
                    (header.clone(), td.text().collect::<String>().trim().to_string())
                })
                .collect::<ScreenerRow>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    Ok(rows)
}

/// Fetches the screener page over plain HTTP and reads the table out of
/// the returned markup.
pub struct HtmlTableScraper {
    client: reqwest::Client,
}

impl HtmlTableScraper {
    pub fn new(config: &ScreenerConfig) -> Result<Self, ScrapeError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .map_err(|e| ScrapeError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ScreenerSource for HtmlTableScraper {
    async fn fetch_table(&self, url: &str, table_id: &str) -> Result<Vec<ScreenerRow>, ScrapeError> {
        debug!("GET {} (table #{})", url, table_id);

        let resp = self.client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ScrapeError::Http(resp.status().as_u16()));
        }

        let html = resp
            .text()
            .await
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        let rows = parse_table(&html, table_id)?;
        debug!("Parsed {} rows from #{}", rows.len(), table_id);

        if is_empty_scan(&rows) {
            return Ok(Vec::new());
        }
        Ok(rows)
    }
}
