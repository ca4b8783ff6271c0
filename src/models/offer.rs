use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::technology::Technology;
use crate::sources::{CanonicalOffer, ContractType};

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Offer {
    pub id: i32,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub contract_type: String,
    pub remote: bool,
    pub source: String,
    pub source_url: String,
    pub posted_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An offer with its technology associations attached, the shape every
/// read endpoint returns.
#[derive(Debug, Serialize)]
pub struct OfferWithTechnologies {
    #[serde(flatten)]
    pub offer: Offer,
    pub technologies: Vec<Technology>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOffer {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub contract_type: Option<ContractType>,
    pub remote: Option<bool>,
    pub source_url: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub technology_ids: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOffer {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub contract_type: Option<ContractType>,
    pub remote: Option<bool>,
    pub source_url: Option<String>,
    pub technology_ids: Option<Vec<i32>>,
}

#[derive(Debug, Deserialize)]
pub struct OfferFilters {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub contract_type: Option<ContractType>,
    pub remote: Option<bool>,
    pub min_salary: Option<i32>,
    pub max_salary: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Offer {
    pub async fn list(pool: &PgPool, filters: &OfferFilters) -> Result<Vec<Offer>, AppError> {
        let per_page = filters.per_page.unwrap_or(50).min(100);
        let offset = (filters.page.unwrap_or(1) - 1).max(0) * per_page;

        let offers = sqlx::query_as::<_, Offer>(
            "SELECT * FROM offers WHERE
                ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
                AND ($2::text IS NULL OR company ILIKE '%' || $2 || '%')
                AND ($3::text IS NULL OR location ILIKE '%' || $3 || '%')
                AND ($4::text IS NULL OR contract_type = $4)
                AND ($5::bool IS NULL OR remote = $5)
                AND ($6::int IS NULL OR salary_min >= $6)
                AND ($7::int IS NULL OR salary_max <= $7)
             ORDER BY posted_at DESC LIMIT $8 OFFSET $9",
        )
        .bind(&filters.title)
        .bind(&filters.company)
        .bind(&filters.location)
        .bind(filters.contract_type.map(|c| c.as_str()))
        .bind(filters.remote)
        .bind(filters.min_salary)
        .bind(filters.max_salary)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(offers)
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<Offer, AppError> {
        sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Offer {id} not found")))
    }

    pub async fn find_by_source_url(pool: &PgPool, url: &str) -> Result<Option<Offer>, AppError> {
        let offer = sqlx::query_as::<_, Offer>("SELECT * FROM offers WHERE source_url = $1")
            .bind(url)
            .fetch_optional(pool)
            .await?;
        Ok(offer)
    }

    pub async fn find_by_title_and_company(
        pool: &PgPool,
        title: &str,
        company: &str,
    ) -> Result<Option<Offer>, AppError> {
        let offer = sqlx::query_as::<_, Offer>(
            "SELECT * FROM offers WHERE LOWER(title) = LOWER($1) AND LOWER(company) = LOWER($2) LIMIT 1",
        )
        .bind(title)
        .bind(company)
        .fetch_optional(pool)
        .await?;
        Ok(offer)
    }

    pub async fn create(pool: &PgPool, input: CreateOffer) -> Result<Offer, AppError> {
        if input.title.trim().is_empty() || input.company.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Offer title and company are required".to_string(),
            ));
        }

        let mut tx = pool.begin().await?;
        let offer = sqlx::query_as::<_, Offer>(
            "INSERT INTO offers (title, company, location, description, salary_min, salary_max, contract_type, remote, source, source_url, posted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'manual', $9, $10) RETURNING *",
        )
        .bind(input.title.trim())
        .bind(input.company.trim())
        .bind(&input.location)
        .bind(&input.description)
        .bind(input.salary_min)
        .bind(input.salary_max)
        .bind(input.contract_type.unwrap_or(ContractType::Unspecified).as_str())
        .bind(input.remote.unwrap_or(false))
        .bind(input.source_url.as_deref().unwrap_or(""))
        .bind(input.posted_at.unwrap_or_else(Utc::now))
        .fetch_one(&mut *tx)
        .await?;

        for technology_id in &input.technology_ids {
            sqlx::query(
                "INSERT INTO offer_technologies (offer_id, technology_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(offer.id)
            .bind(technology_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(offer)
    }

    /// Persist a normalized external offer with resolved technology
    /// ids. The import orchestrator is the only caller.
    pub async fn insert_canonical(
        pool: &PgPool,
        offer: &CanonicalOffer,
        technology_ids: &[i32],
    ) -> Result<Offer, AppError> {
        let mut tx = pool.begin().await?;
        let stored = sqlx::query_as::<_, Offer>(
            "INSERT INTO offers (title, company, location, description, salary_min, salary_max, contract_type, remote, source, source_url, posted_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
        )
        .bind(&offer.title)
        .bind(&offer.company)
        .bind(&offer.location)
        .bind(&offer.description)
        .bind(offer.salary_min)
        .bind(offer.salary_max)
        .bind(offer.contract_type.as_str())
        .bind(offer.remote)
        .bind(&offer.source)
        .bind(&offer.source_url)
        .bind(offer.posted_at)
        .fetch_one(&mut *tx)
        .await?;

        for technology_id in technology_ids {
            sqlx::query(
                "INSERT INTO offer_technologies (offer_id, technology_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(stored.id)
            .bind(technology_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(stored)
    }

    pub async fn update(pool: &PgPool, id: i32, input: UpdateOffer) -> Result<Offer, AppError> {
        let existing = Self::get(pool, id).await?;
        let mut tx = pool.begin().await?;
        let offer = sqlx::query_as::<_, Offer>(
            "UPDATE offers SET title = $2, company = $3, location = $4, description = $5, salary_min = $6, salary_max = $7, contract_type = $8, remote = $9, source_url = $10, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(input.title.unwrap_or(existing.title))
        .bind(input.company.unwrap_or(existing.company))
        .bind(input.location.or(existing.location))
        .bind(input.description.or(existing.description))
        .bind(input.salary_min.or(existing.salary_min))
        .bind(input.salary_max.or(existing.salary_max))
        .bind(
            input
                .contract_type
                .map(|c| c.as_str().to_string())
                .unwrap_or(existing.contract_type),
        )
        .bind(input.remote.unwrap_or(existing.remote))
        .bind(input.source_url.unwrap_or(existing.source_url))
        .fetch_one(&mut *tx)
        .await?;

        if let Some(technology_ids) = input.technology_ids {
            sqlx::query("DELETE FROM offer_technologies WHERE offer_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for technology_id in &technology_ids {
                sqlx::query(
                    "INSERT INTO offer_technologies (offer_id, technology_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                )
                .bind(id)
                .bind(technology_id)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;
        Ok(offer)
    }

    pub async fn delete(pool: &PgPool, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Offer {id} not found")));
        }
        Ok(())
    }

    pub async fn with_technologies(
        self,
        pool: &PgPool,
    ) -> Result<OfferWithTechnologies, AppError> {
        let technologies = Technology::for_offer(pool, self.id).await?;
        Ok(OfferWithTechnologies {
            offer: self,
            technologies,
        })
    }
}
