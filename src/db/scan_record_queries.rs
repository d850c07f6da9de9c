use chrono::NaiveDate;
use sqlx::PgPool;

use crate::models::{ScanRecord, StoredScanRecord, TradeFill, TradeStatus};

const COLUMNS: &str = "pk, id, stock_name, symbol, security_id, change, price, volume,
                       quantity, buy_price, sell_price, status, state, date";

pub async fn find_one(
    pool: &PgPool,
    table: &str,
    date: Option<NaiveDate>,
    status: Option<TradeStatus>,
) -> Result<Option<StoredScanRecord>, sqlx::Error> {
    sqlx::query_as::<_, StoredScanRecord>(&format!(
        "SELECT {COLUMNS}
         FROM {table}
         WHERE ($1::date IS NULL OR date = $1)
           AND ($2::text IS NULL OR status = $2)
         ORDER BY pk
         LIMIT 1"
    ))
        .bind(date)
        .bind(status)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_all(
    pool: &PgPool,
    table: &str,
) -> Result<Vec<StoredScanRecord>, sqlx::Error> {
    sqlx::query_as::<_, StoredScanRecord>(&format!(
        "SELECT {COLUMNS} FROM {table} ORDER BY date DESC, pk DESC"
    ))
        .fetch_all(pool)
        .await
}

pub async fn insert(
    pool: &PgPool,
    table: &str,
    record: &ScanRecord,
) -> Result<StoredScanRecord, sqlx::Error> {
    sqlx::query_as::<_, StoredScanRecord>(&format!(
        "INSERT INTO {table}
            (id, stock_name, symbol, security_id, change, price, volume,
             quantity, buy_price, sell_price, status, state, date)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         RETURNING {COLUMNS}"
    ))
        .bind(&record.id)
        .bind(&record.stock_name)
        .bind(&record.symbol)
        .bind(&record.security_id)
        .bind(record.change)
        .bind(&record.price)
        .bind(&record.volume)
        .bind(record.quantity)
        .bind(record.buy_price)
        .bind(record.sell_price)
        .bind(record.status)
        .bind(record.state)
        .bind(record.date)
        .fetch_one(pool)
        .await
}

/// Overwrites every field of the row identified by `pk`; the identity is kept.
pub async fn replace(
    pool: &PgPool,
    table: &str,
    pk: i64,
    record: &ScanRecord,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(&format!(
        "UPDATE {table}
         SET id = $2, stock_name = $3, symbol = $4, security_id = $5, change = $6,
             price = $7, volume = $8, quantity = $9, buy_price = $10, sell_price = $11,
             status = $12, state = $13, date = $14
         WHERE pk = $1"
    ))
        .bind(pk)
        .bind(&record.id)
        .bind(&record.stock_name)
        .bind(&record.symbol)
        .bind(&record.security_id)
        .bind(record.change)
        .bind(&record.price)
        .bind(&record.volume)
        .bind(record.quantity)
        .bind(record.buy_price)
        .bind(record.sell_price)
        .bind(record.status)
        .bind(record.state)
        .bind(record.date)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Writes a trade fill only if the row still holds `expected`.
pub async fn apply_fill(
    pool: &PgPool,
    table: &str,
    pk: i64,
    expected: TradeStatus,
    fill: &TradeFill,
) -> Result<u64, sqlx::Error> {
    let price_column = match fill.status {
        TradeStatus::Sold => "sell_price",
        _ => "buy_price",
    };
    let result = sqlx::query(&format!(
        "UPDATE {table}
         SET status = $3, state = $4, quantity = $5, {price_column} = $6
         WHERE pk = $1 AND status = $2"
    ))
        .bind(pk)
        .bind(expected)
        .bind(fill.status)
        .bind(fill.state())
        .bind(fill.quantity)
        .bind(fill.price)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
