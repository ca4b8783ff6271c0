use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::AppError;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Technology {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTechnology {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTechnology {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TechnologyFilters {
    pub category: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Read-side trend entry: how often a technology appears across stored
/// offers.
#[derive(Debug, Serialize)]
pub struct TechTrend {
    pub name: String,
    pub category: Option<String>,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TechnologyWithStats {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub offer_count: i64,
}

impl Technology {
    pub async fn list(
        pool: &PgPool,
        filters: &TechnologyFilters,
    ) -> Result<Vec<Technology>, AppError> {
        let per_page = filters.per_page.unwrap_or(100).min(200);
        let offset = (filters.page.unwrap_or(1) - 1).max(0) * per_page;

        let technologies = sqlx::query_as::<_, Technology>(
            "SELECT * FROM technologies WHERE ($1::text IS NULL OR category = $1) ORDER BY name LIMIT $2 OFFSET $3",
        )
        .bind(&filters.category)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(technologies)
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<Technology, AppError> {
        sqlx::query_as::<_, Technology>("SELECT * FROM technologies WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Technology {id} not found")))
    }

    /// Case-insensitive lookup-or-insert, the import path's resolution
    /// primitive. The no-op update makes RETURNING work on conflict.
    pub async fn find_or_create(
        pool: &PgPool,
        name: &str,
        category: &str,
    ) -> Result<Technology, AppError> {
        let technology = sqlx::query_as::<_, Technology>(
            "INSERT INTO technologies (name, category) VALUES ($1, $2)
             ON CONFLICT (LOWER(name)) DO UPDATE SET name = technologies.name
             RETURNING *",
        )
        .bind(name)
        .bind(category)
        .fetch_one(pool)
        .await?;
        Ok(technology)
    }

    pub async fn create(pool: &PgPool, input: CreateTechnology) -> Result<Technology, AppError> {
        if input.name.trim().is_empty() {
            return Err(AppError::BadRequest("Technology name is required".to_string()));
        }
        let technology = sqlx::query_as::<_, Technology>(
            "INSERT INTO technologies (name, category, description) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(input.name.trim())
        .bind(&input.category)
        .bind(&input.description)
        .fetch_one(pool)
        .await?;
        Ok(technology)
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        input: UpdateTechnology,
    ) -> Result<Technology, AppError> {
        let existing = Self::get(pool, id).await?;
        let technology = sqlx::query_as::<_, Technology>(
            "UPDATE technologies SET name = $2, category = $3, description = $4 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(input.name.unwrap_or(existing.name))
        .bind(input.category.or(existing.category))
        .bind(input.description.or(existing.description))
        .fetch_one(pool)
        .await?;
        Ok(technology)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM technologies WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Technology {id} not found")));
        }
        Ok(())
    }

    /// Technologies attached to one offer, for response assembly.
    pub async fn for_offer(pool: &PgPool, offer_id: i32) -> Result<Vec<Technology>, AppError> {
        let technologies = sqlx::query_as::<_, Technology>(
            "SELECT t.* FROM technologies t
             JOIN offer_technologies ot ON ot.technology_id = t.id
             WHERE ot.offer_id = $1 ORDER BY t.name",
        )
        .bind(offer_id)
        .fetch_all(pool)
        .await?;
        Ok(technologies)
    }

    /// Most-mentioned technologies across all stored offers, with their
    /// share of the total offer count.
    pub async fn trends(pool: &PgPool, limit: i64) -> Result<Vec<TechTrend>, AppError> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM offers")
            .fetch_one(pool)
            .await?;
        if total.0 == 0 {
            return Ok(Vec::new());
        }

        let rows: Vec<(String, Option<String>, i64)> = sqlx::query_as(
            "SELECT t.name, t.category, COUNT(ot.offer_id) AS count
             FROM technologies t
             JOIN offer_technologies ot ON ot.technology_id = t.id
             GROUP BY t.id ORDER BY count DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, category, count)| TechTrend {
                name,
                category,
                count,
                percentage: (count as f64 / total.0 as f64) * 100.0,
            })
            .collect())
    }

    /// Every technology with its associated offer count, zeros included.
    pub async fn stats(pool: &PgPool) -> Result<Vec<TechnologyWithStats>, AppError> {
        let rows = sqlx::query_as::<_, TechnologyWithStats>(
            "SELECT t.id, t.name, t.category, t.description, t.created_at,
                    COUNT(ot.offer_id) AS offer_count
             FROM technologies t
             LEFT JOIN offer_technologies ot ON ot.technology_id = t.id
             GROUP BY t.id ORDER BY offer_count DESC, t.name",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
