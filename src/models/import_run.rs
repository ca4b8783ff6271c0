use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppError;

/// Audit record for one triggered import job.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ImportRun {
    pub id: i32,
    pub source: String,
    pub status: String,
    pub offers_found: Option<i32>,
    pub offers_imported: Option<i32>,
    pub error: Option<String>,
    pub requested_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ImportRun {
    pub async fn enqueue(pool: &PgPool, source: &str) -> Result<ImportRun, AppError> {
        let run = sqlx::query_as::<_, ImportRun>(
            "INSERT INTO import_runs (source) VALUES ($1) RETURNING *",
        )
        .bind(source)
        .fetch_one(pool)
        .await?;
        Ok(run)
    }

    pub async fn mark_running(pool: &PgPool, id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE import_runs SET status = 'running', started_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// `offers_found` is unknown for aggregate runs and stays NULL there.
    pub async fn mark_succeeded(
        pool: &PgPool,
        id: i32,
        offers_found: Option<i32>,
        offers_imported: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE import_runs SET status = 'succeeded', offers_found = $2, offers_imported = $3, finished_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(offers_found)
        .bind(offers_imported)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_failed(pool: &PgPool, id: i32, error: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE import_runs SET status = 'failed', error = $2, finished_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Recent runs, optionally filtered by source name.
    pub async fn recent(
        pool: &PgPool,
        source: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ImportRun>, AppError> {
        let runs = sqlx::query_as::<_, ImportRun>(
            "SELECT * FROM import_runs WHERE ($1::text IS NULL OR source = $1) ORDER BY requested_at DESC LIMIT $2",
        )
        .bind(source)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(runs)
    }
}
