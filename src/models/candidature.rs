use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::AppError;

/// Allowed application statuses, in rough lifecycle order.
pub const STATUSES: [&str; 8] = [
    "pending",
    "applied",
    "interview",
    "technical_test",
    "offer_received",
    "accepted",
    "rejected",
    "withdrawn",
];

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Candidature {
    pub id: i32,
    pub offer_id: i32,
    pub status: String,
    pub application_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub next_step: Option<String>,
    pub next_step_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCandidature {
    pub offer_id: i32,
    pub status: Option<String>,
    pub application_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub next_step: Option<String>,
    pub next_step_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCandidature {
    pub status: Option<String>,
    pub application_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub next_step: Option<String>,
    pub next_step_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatureFilters {
    pub status: Option<String>,
    pub offer_id: Option<i32>,
}

fn validate_status(status: &str) -> Result<(), AppError> {
    if STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Invalid status '{status}', expected one of: {}",
            STATUSES.join(", ")
        )))
    }
}

impl Candidature {
    pub async fn list(
        pool: &PgPool,
        filters: &CandidatureFilters,
    ) -> Result<Vec<Candidature>, AppError> {
        let candidatures = sqlx::query_as::<_, Candidature>(
            "SELECT * FROM candidatures WHERE ($1::text IS NULL OR status = $1) AND ($2::int IS NULL OR offer_id = $2) ORDER BY created_at DESC",
        )
        .bind(&filters.status)
        .bind(filters.offer_id)
        .fetch_all(pool)
        .await?;
        Ok(candidatures)
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<Candidature, AppError> {
        sqlx::query_as::<_, Candidature>("SELECT * FROM candidatures WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Candidature {id} not found")))
    }

    pub async fn create(
        pool: &PgPool,
        input: CreateCandidature,
    ) -> Result<Candidature, AppError> {
        let status = input.status.unwrap_or_else(|| "pending".to_string());
        validate_status(&status)?;

        let candidature = sqlx::query_as::<_, Candidature>(
            "INSERT INTO candidatures (offer_id, status, application_date, notes, next_step, next_step_date) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(input.offer_id)
        .bind(&status)
        .bind(input.application_date)
        .bind(&input.notes)
        .bind(&input.next_step)
        .bind(input.next_step_date)
        .fetch_one(pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(format!("Offer {} not found", input.offer_id))
            }
            _ => AppError::Database(e),
        })?;
        Ok(candidature)
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        input: UpdateCandidature,
    ) -> Result<Candidature, AppError> {
        if let Some(status) = &input.status {
            validate_status(status)?;
        }
        let existing = Self::get(pool, id).await?;
        let candidature = sqlx::query_as::<_, Candidature>(
            "UPDATE candidatures SET status = $2, application_date = $3, notes = $4, next_step = $5, next_step_date = $6, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(input.status.unwrap_or(existing.status))
        .bind(input.application_date.or(existing.application_date))
        .bind(input.notes.or(existing.notes))
        .bind(input.next_step.or(existing.next_step))
        .bind(input.next_step_date.or(existing.next_step_date))
        .fetch_one(pool)
        .await?;
        Ok(candidature)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM candidatures WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Candidature {id} not found")));
        }
        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_pass_validation() {
        for status in STATUSES {
            assert!(validate_status(status).is_ok());
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(validate_status("ghosted").is_err());
        assert!(validate_status("").is_err());
    }
}
