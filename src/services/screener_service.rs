use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::screener_source::{is_empty_scan, ScreenerRow, ScreenerSource};
use crate::external::security_master::SecurityMaster;
use crate::models::{ScanRecord, StoredScanRecord};
use crate::store::{RecordFilter, RecordStore};

pub const COL_STOCK_NAME: &str = "Stock Name";
pub const COL_SYMBOL: &str = "Symbol";
pub const COL_CHANGE: &str = "% Chg";
pub const COL_PRICE: &str = "Price";
pub const COL_VOLUME: &str = "Volume";

/// Result of one scan run.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// Today's record was written. `replaced` is true when an earlier scan
    /// of the same day was overwritten.
    Stored { record: StoredScanRecord, replaced: bool },
    /// The screener matched nothing today.
    NoRows,
    /// Rows came back but none had a usable symbol and change value.
    NoCandidates,
}

impl ScanOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ScanOutcome::Stored { replaced: true, .. } => "replaced",
            ScanOutcome::Stored { .. } => "inserted",
            ScanOutcome::NoRows => "no_rows",
            ScanOutcome::NoCandidates => "no_candidates",
        }
    }
}

/// Parses a percentage cell such as `"4.1%"` or `" -0.75 % "`.
pub fn parse_change(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .trim_start_matches('+')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Row with the largest `% Chg`. On ties the earliest row wins; rows with
/// no symbol or an unreadable change are skipped.
pub fn select_top_mover(rows: &[ScreenerRow]) -> Option<(&ScreenerRow, f64)> {
    let mut best: Option<(&ScreenerRow, f64)> = None;

    for row in rows {
        let has_symbol = row.get(COL_SYMBOL).is_some_and(|s| !s.trim().is_empty());
        let change = row.get(COL_CHANGE).and_then(|c| parse_change(c));

        let Some(change) = change.filter(|_| has_symbol) else {
            warn!("Skipping screener row without a symbol or % change: {:?}", row);
            continue;
        };

        match best {
            Some((_, top)) if change <= top => {}
            _ => best = Some((row, change)),
        }
    }

    best
}

/// Turns the selected row into today's `scanned` record.
pub fn build_record(
    row: &ScreenerRow,
    change: f64,
    security_id: Option<String>,
    today: NaiveDate,
) -> ScanRecord {
    let cell = |name: &str| row.get(name).map(|v| v.trim().to_string());

    ScanRecord::scanned(
        cell(COL_STOCK_NAME),
        cell(COL_SYMBOL).unwrap_or_default(),
        security_id,
        change,
        cell(COL_PRICE),
        cell(COL_VOLUME),
        today,
    )
}

/// Scrapes the screener, picks the day's top mover and upserts it as the
/// record for `today`.
pub struct ScreenerCollector {
    source: Arc<dyn ScreenerSource>,
    master: Arc<SecurityMaster>,
    store: Arc<dyn RecordStore>,
    url: String,
    table_id: String,
}

impl ScreenerCollector {
    pub fn new(
        source: Arc<dyn ScreenerSource>,
        master: Arc<SecurityMaster>,
        store: Arc<dyn RecordStore>,
        url: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            source,
            master,
            store,
            url: url.into(),
            table_id: table_id.into(),
        }
    }

    pub async fn collect(&self, today: NaiveDate) -> Result<ScanOutcome, AppError> {
        info!("Starting screener scan for {} from {}", today, self.url);

        let rows = self.source.fetch_table(&self.url, &self.table_id).await?;
        if is_empty_scan(&rows) {
            warn!("No valid stock data available to process.");
            return Ok(ScanOutcome::NoRows);
        }

        let Some((row, change)) = select_top_mover(&rows) else {
            warn!("None of the {} screener rows had a usable % change", rows.len());
            return Ok(ScanOutcome::NoCandidates);
        };

        let symbol = row.get(COL_SYMBOL).map(|s| s.trim()).unwrap_or_default();
        let security_id = self.master.lookup(symbol).map(str::to_string);
        if security_id.is_none() {
            warn!("Security ID not found for symbol: {}", symbol);
        }

        let record = build_record(row, change, security_id, today);
        let (stored, replaced) = self.upsert(record).await?;

        info!(
            "{} {} record for {}: {} ({:+.2}%)",
            if replaced { "Replaced" } else { "Inserted" },
            self.store.collection().table_name(),
            today,
            stored.record.symbol,
            stored.record.change
        );

        Ok(ScanOutcome::Stored { record: stored, replaced })
    }

    // Overwrites today's record in place if there is one, keeping its identity.
    async fn upsert(&self, record: ScanRecord) -> Result<(StoredScanRecord, bool), AppError> {
        if let Some(existing) = self.store.find_one(RecordFilter::by_date(record.date)).await? {
            if self.store.replace_fields(existing.pk, &record).await? {
                return Ok((StoredScanRecord { pk: existing.pk, record }, true));
            }
        }

        let stored = self.store.insert_one(&record).await?;
        Ok((stored, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::screener_source::{NO_RESULTS_SENTINEL, SERIAL_COLUMN};
    use crate::models::TradeStatus;
    use crate::store::{MemoryRecordStore, RecordCollection};
    use crate::test_support::CannedSource;

    fn row(symbol: &str, change: &str) -> ScreenerRow {
        [
            (COL_STOCK_NAME, format!("{symbol} Ltd")),
            (COL_SYMBOL, symbol.to_string()),
            (COL_CHANGE, change.to_string()),
            (COL_PRICE, "100".to_string()),
            (COL_VOLUME, "5000".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn collector(rows: Vec<ScreenerRow>, store: Arc<MemoryRecordStore>) -> ScreenerCollector {
        let master = SecurityMaster::from_json(
            r#"[{"SEM_TRADING_SYMBOL":"B","SEM_SMST_SECURITY_ID":"500"}]"#,
        )
        .unwrap();
        ScreenerCollector::new(
            Arc::new(CannedSource::new(rows)),
            Arc::new(master),
            store,
            "https://screener.test/scan",
            "DataTables_Table_0",
        )
    }

    #[test]
    fn test_parse_change() {
        assert_eq!(parse_change("4.1%"), Some(4.1));
        assert_eq!(parse_change(" -0.75 % "), Some(-0.75));
        assert_eq!(parse_change("+2"), Some(2.0));
        assert_eq!(parse_change("n/a"), None);
    }

    #[test]
    fn test_selects_strict_maximum() {
        let rows = vec![row("A", "2.5%"), row("B", "4.1%"), row("C", "-1%")];
        let (top, change) = select_top_mover(&rows).unwrap();
        assert_eq!(top[COL_SYMBOL], "B");
        assert_eq!(change, 4.1);
    }

    #[test]
    fn test_tie_keeps_first_row() {
        let rows = vec![row("A", "3%"), row("B", "3%")];
        assert_eq!(select_top_mover(&rows).unwrap().0[COL_SYMBOL], "A");
    }

    #[test]
    fn test_unreadable_rows_are_skipped() {
        let rows = vec![row("A", "bad"), row("", "9%"), row("C", "1.5%")];
        assert_eq!(select_top_mover(&rows).unwrap().0[COL_SYMBOL], "C");
        assert!(select_top_mover(&[row("A", "bad")]).is_none());
    }

    #[tokio::test]
    async fn test_scan_inserts_todays_record() {
        let store = Arc::new(MemoryRecordStore::new(RecordCollection::Simulated));
        let outcome = collector(vec![row("A", "2.5%"), row("B", "4.1%")], store.clone())
            .collect(day(3))
            .await
            .unwrap();

        let ScanOutcome::Stored { record, replaced } = outcome else {
            panic!("expected a stored record");
        };
        assert!(!replaced);
        assert_eq!(record.record.symbol, "B");
        assert_eq!(record.record.change, 4.1);
        assert_eq!(record.record.security_id.as_deref(), Some("500"));
        assert_eq!(record.record.status, TradeStatus::Scanned);
        assert_eq!(record.record.quantity, 0);
        assert_eq!(record.record.date, day(3));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_second_scan_same_day_replaces() {
        let store = Arc::new(MemoryRecordStore::new(RecordCollection::Simulated));
        collector(vec![row("A", "2.5%")], store.clone()).collect(day(3)).await.unwrap();
        let first_pk = store.snapshot()[0].pk;

        let outcome = collector(vec![row("C", "7%")], store.clone())
            .collect(day(3))
            .await
            .unwrap();

        assert!(matches!(outcome, ScanOutcome::Stored { replaced: true, .. }));
        let rows = store.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pk, first_pk);
        assert_eq!(rows[0].record.symbol, "C");
        assert_eq!(rows[0].record.change, 7.0);
        assert_eq!(rows[0].record.security_id, None);
    }

    #[tokio::test]
    async fn test_new_day_adds_a_record() {
        let store = Arc::new(MemoryRecordStore::new(RecordCollection::Simulated));
        collector(vec![row("A", "2.5%")], store.clone()).collect(day(3)).await.unwrap();
        collector(vec![row("B", "1%")], store.clone()).collect(day(4)).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_sentinel_row_leaves_store_untouched() {
        let store = Arc::new(MemoryRecordStore::new(RecordCollection::Simulated));
        let sentinel: ScreenerRow =
            [(SERIAL_COLUMN.to_string(), NO_RESULTS_SENTINEL.to_string())].into_iter().collect();

        let outcome = collector(vec![sentinel], store.clone()).collect(day(3)).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::NoRows));

        let outcome = collector(vec![], store.clone()).collect(day(3)).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::NoRows));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_rows_without_change_yield_no_candidates() {
        let store = Arc::new(MemoryRecordStore::new(RecordCollection::Simulated));
        let outcome = collector(vec![row("A", "-"), row("B", "")], store.clone())
            .collect(day(3))
            .await
            .unwrap();
        assert!(matches!(outcome, ScanOutcome::NoCandidates));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_propagates_without_writes() {
        let store = Arc::new(MemoryRecordStore::new(RecordCollection::Simulated));
        let collector = ScreenerCollector::new(
            Arc::new(CannedSource::failing()),
            Arc::new(SecurityMaster::default()),
            store.clone(),
            "https://screener.test/scan",
            "t",
        );
        assert!(collector.collect(day(3)).await.is_err());
        assert!(store.is_empty());
    }
}
