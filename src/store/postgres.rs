use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::scan_record_queries;
use crate::models::{ScanRecord, StoredScanRecord, TradeFill, TradeStatus};
use crate::store::{RecordCollection, RecordFilter, RecordStore};

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    collection: RecordCollection,
}

impl PgRecordStore {
    pub fn new(pool: PgPool, collection: RecordCollection) -> Self {
        Self { pool, collection }
    }

    fn table(&self) -> &'static str {
        self.collection.table_name()
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    fn collection(&self) -> RecordCollection {
        self.collection
    }

    async fn find_one(&self, filter: RecordFilter) -> Result<Option<StoredScanRecord>, sqlx::Error> {
        scan_record_queries::find_one(&self.pool, self.table(), filter.date, filter.status).await
    }

    async fn find_all(&self) -> Result<Vec<StoredScanRecord>, sqlx::Error> {
        scan_record_queries::fetch_all(&self.pool, self.table()).await
    }

    async fn insert_one(&self, record: &ScanRecord) -> Result<StoredScanRecord, sqlx::Error> {
        scan_record_queries::insert(&self.pool, self.table(), record).await
    }

    async fn replace_fields(&self, pk: i64, record: &ScanRecord) -> Result<bool, sqlx::Error> {
        let affected = scan_record_queries::replace(&self.pool, self.table(), pk, record).await?;
        Ok(affected > 0)
    }

    async fn apply_fill(
        &self,
        pk: i64,
        expected: TradeStatus,
        fill: &TradeFill,
    ) -> Result<bool, sqlx::Error> {
        let affected =
            scan_record_queries::apply_fill(&self.pool, self.table(), pk, expected, fill).await?;
        Ok(affected > 0)
    }
}
