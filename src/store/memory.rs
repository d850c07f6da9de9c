use async_trait::async_trait;
use parking_lot::Mutex;

use crate::models::{ScanRecord, StoredScanRecord, TradeFill, TradeStatus};
use crate::store::{RecordCollection, RecordFilter, RecordStore};

/// Process-local store with the same contract as the Postgres tables,
/// including the one-record-per-date constraint.
pub struct MemoryRecordStore {
    collection: RecordCollection,
    inner: Mutex<Inner>,
}

struct Inner {
    next_pk: i64,
    rows: Vec<StoredScanRecord>,
}

impl MemoryRecordStore {
    pub fn new(collection: RecordCollection) -> Self {
        Self {
            collection,
            inner: Mutex::new(Inner { next_pk: 1, rows: Vec::new() }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all rows in insertion order.
    pub fn snapshot(&self) -> Vec<StoredScanRecord> {
        self.inner.lock().rows.clone()
    }
}

fn matches(filter: &RecordFilter, record: &ScanRecord) -> bool {
    filter.date.map_or(true, |d| record.date == d)
        && filter.status.map_or(true, |s| record.status == s)
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn collection(&self) -> RecordCollection {
        self.collection
    }

    async fn find_one(&self, filter: RecordFilter) -> Result<Option<StoredScanRecord>, sqlx::Error> {
        let inner = self.inner.lock();
        Ok(inner.rows.iter().find(|r| matches(&filter, &r.record)).cloned())
    }

    async fn find_all(&self) -> Result<Vec<StoredScanRecord>, sqlx::Error> {
        let mut rows = self.inner.lock().rows.clone();
        rows.sort_by(|a, b| b.record.date.cmp(&a.record.date).then(b.pk.cmp(&a.pk)));
        Ok(rows)
    }

    async fn insert_one(&self, record: &ScanRecord) -> Result<StoredScanRecord, sqlx::Error> {
        let mut inner = self.inner.lock();
        if inner.rows.iter().any(|r| r.record.date == record.date) {
            return Err(sqlx::Error::Protocol(format!(
                "duplicate record for date {} in {}",
                record.date,
                self.collection.table_name()
            )));
        }
        let stored = StoredScanRecord { pk: inner.next_pk, record: record.clone() };
        inner.next_pk += 1;
        inner.rows.push(stored.clone());
        Ok(stored)
    }

    async fn replace_fields(&self, pk: i64, record: &ScanRecord) -> Result<bool, sqlx::Error> {
        let mut inner = self.inner.lock();
        match inner.rows.iter_mut().find(|r| r.pk == pk) {
            Some(row) => {
                row.record = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn apply_fill(
        &self,
        pk: i64,
        expected: TradeStatus,
        fill: &TradeFill,
    ) -> Result<bool, sqlx::Error> {
        let mut inner = self.inner.lock();
        match inner.rows.iter_mut().find(|r| r.pk == pk && r.record.status == expected) {
            Some(row) => {
                fill.apply(&mut row.record);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn record(symbol: &str, date: NaiveDate) -> ScanRecord {
        ScanRecord::scanned(None, symbol.into(), None, 1.0, None, None, date)
    }

    #[tokio::test]
    async fn test_find_one_by_date_and_status() {
        let store = MemoryRecordStore::new(RecordCollection::Simulated);
        store.insert_one(&record("A", day(3))).await.unwrap();
        store.insert_one(&record("B", day(4))).await.unwrap();

        let hit = store
            .find_one(RecordFilter::by_date_and_status(day(4), TradeStatus::Scanned))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.record.symbol, "B");

        let miss = store
            .find_one(RecordFilter::by_date_and_status(day(4), TradeStatus::Bought))
            .await
            .unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_rejects_second_insert_for_same_date() {
        let store = MemoryRecordStore::new(RecordCollection::Live);
        store.insert_one(&record("A", day(3))).await.unwrap();
        assert!(store.insert_one(&record("B", day(3))).await.is_err());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_keeps_identity() {
        let store = MemoryRecordStore::new(RecordCollection::Simulated);
        let stored = store.insert_one(&record("A", day(3))).await.unwrap();

        assert!(store.replace_fields(stored.pk, &record("Z", day(3))).await.unwrap());
        assert!(!store.replace_fields(99, &record("Z", day(3))).await.unwrap());

        let rows = store.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pk, stored.pk);
        assert_eq!(rows[0].record.symbol, "Z");
    }

    #[tokio::test]
    async fn test_apply_fill_checks_expected_status() {
        let store = MemoryRecordStore::new(RecordCollection::Simulated);
        let stored = store.insert_one(&record("A", day(3))).await.unwrap();
        let fill = TradeFill { status: TradeStatus::Bought, quantity: 5, price: 10.0 };

        assert!(store.apply_fill(stored.pk, TradeStatus::Scanned, &fill).await.unwrap());
        // Second writer read `scanned` too, but the row has moved on.
        assert!(!store.apply_fill(stored.pk, TradeStatus::Scanned, &fill).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_all_newest_first() {
        let store = MemoryRecordStore::new(RecordCollection::Simulated);
        store.insert_one(&record("OLD", day(1))).await.unwrap();
        store.insert_one(&record("NEW", day(9))).await.unwrap();
        store.insert_one(&record("MID", day(5))).await.unwrap();

        let symbols: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.record.symbol)
            .collect();
        assert_eq!(symbols, vec!["NEW", "MID", "OLD"]);
    }
}
