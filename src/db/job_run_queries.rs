use sqlx::PgPool;

pub async fn record_start(pool: &PgPool, job_name: &str) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO job_runs (job_name, status)
         VALUES ($1, 'running')
         RETURNING id"
    )
        .bind(job_name)
        .fetch_one(pool)
        .await
}

pub async fn record_success(
    pool: &PgPool,
    job_id: i32,
    outcome: &str,
    items_processed: i32,
    duration_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE job_runs
         SET completed_at = NOW(),
             status = 'success',
             outcome = $2,
             items_processed = $3,
             duration_ms = $4
         WHERE id = $1"
    )
        .bind(job_id)
        .bind(outcome)
        .bind(items_processed)
        .bind(duration_ms)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn record_failure(
    pool: &PgPool,
    job_id: i32,
    error_message: &str,
    duration_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE job_runs
         SET completed_at = NOW(),
             status = 'failed',
             error_message = $2,
             duration_ms = $3
         WHERE id = $1"
    )
        .bind(job_id)
        .bind(error_message)
        .bind(duration_ms)
        .execute(pool)
        .await?;
    Ok(())
}
