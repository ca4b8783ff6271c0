use axum::Json;
use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::sources::federated::{DEFAULT_LIMIT, FederatedQuery, SortBy, federated_search};
use crate::sources::{CanonicalOffer, ContractType};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExternalOffersQuery {
    pub keywords: Option<String>,
    pub location: Option<String>,
    pub contract_type: Option<ContractType>,
    pub remote: Option<bool>,
    /// "all" or a single source name.
    pub sources: Option<String>,
    pub sort_by: Option<SortBy>,
    pub limit: Option<usize>,
    pub page: Option<u32>,
    pub tech_only: Option<bool>,
}

/// Response shape for live offers. `id` is a sentinel 0 since these are
/// never persisted.
#[derive(Debug, Serialize)]
pub struct ExternalOffer {
    pub id: i32,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub contract_type: ContractType,
    pub remote: bool,
    pub source: String,
    pub url: String,
    pub posted_at: DateTime<Utc>,
    pub technologies: Vec<String>,
}

impl From<CanonicalOffer> for ExternalOffer {
    fn from(offer: CanonicalOffer) -> Self {
        ExternalOffer {
            id: 0,
            title: offer.title,
            company: offer.company,
            location: offer.location,
            description: offer.description,
            salary_min: offer.salary_min,
            salary_max: offer.salary_max,
            contract_type: offer.contract_type,
            remote: offer.remote,
            source: offer.source,
            url: offer.source_url,
            posted_at: offer.posted_at,
            technologies: offer.technologies,
        }
    }
}

/// GET /api/external-offers — live federated search across providers,
/// nothing is stored.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<ExternalOffersQuery>,
) -> Result<Json<Vec<ExternalOffer>>, AppError> {
    let selector = query.sources.as_deref().unwrap_or("all");
    let adapters = state.sources.select(selector);
    if adapters.is_empty() {
        return Err(AppError::BadRequest(format!("Unknown source '{selector}'")));
    }

    let federated = FederatedQuery {
        keywords: query.keywords,
        location: query.location,
        contract_type: query.contract_type,
        remote: query.remote,
        tech_only: query.tech_only.unwrap_or(true),
        sort_by: query.sort_by.unwrap_or(SortBy::Date),
        limit: query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 200),
        page: query.page.unwrap_or(0),
    };

    let offers = federated_search(&adapters, &state.catalog, &state.classifier, &federated).await;
    Ok(Json(offers.into_iter().map(ExternalOffer::from).collect()))
}
