//! Daily record store.
//!
//! One scan record per calendar date, addressed by a logical collection
//! (live or simulated). The two collections are structurally identical.
//! The store offers find-one-by-filter, insert and replace-by-identity;
//! callers compose those into upserts and transitions. Nothing here makes
//! a find followed by a write atomic, except `apply_fill`, which only
//! writes when the row still holds the status the caller read.

#[cfg(test)]
mod memory;
mod postgres;

#[cfg(test)]
pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{ScanRecord, StoredScanRecord, TradeFill, TradeStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordCollection {
    Live,
    Simulated,
}

impl RecordCollection {
    pub fn table_name(&self) -> &'static str {
        match self {
            RecordCollection::Live => "stock_data",
            RecordCollection::Simulated => "test_stock_data",
        }
    }
}

/// Exact-match filter; `None` fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecordFilter {
    pub date: Option<NaiveDate>,
    pub status: Option<TradeStatus>,
}

impl RecordFilter {
    pub fn by_date(date: NaiveDate) -> Self {
        Self { date: Some(date), status: None }
    }

    pub fn by_status(status: TradeStatus) -> Self {
        Self { date: None, status: Some(status) }
    }

    pub fn by_date_and_status(date: NaiveDate, status: TradeStatus) -> Self {
        Self { date: Some(date), status: Some(status) }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    fn collection(&self) -> RecordCollection;

    /// First matching record in insertion order.
    async fn find_one(&self, filter: RecordFilter) -> Result<Option<StoredScanRecord>, sqlx::Error>;

    /// Every record, newest date first.
    async fn find_all(&self) -> Result<Vec<StoredScanRecord>, sqlx::Error>;

    async fn insert_one(&self, record: &ScanRecord) -> Result<StoredScanRecord, sqlx::Error>;

    /// Overwrites all fields of the record with identity `pk`. Returns false
    /// when no such record exists.
    async fn replace_fields(&self, pk: i64, record: &ScanRecord) -> Result<bool, sqlx::Error>;

    /// Writes `fill` onto record `pk` if its status is still `expected`.
    /// Returns false when the record moved on in the meantime.
    async fn apply_fill(
        &self,
        pk: i64,
        expected: TradeStatus,
        fill: &TradeFill,
    ) -> Result<bool, sqlx::Error>;
}
