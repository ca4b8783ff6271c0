use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::technology::{
    CreateTechnology, TechTrend, Technology, TechnologyFilters, TechnologyWithStats,
    UpdateTechnology,
};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<TechnologyFilters>,
) -> Result<Json<Vec<Technology>>, AppError> {
    let technologies = Technology::list(&state.pool, &filters).await?;
    Ok(Json(technologies))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Technology>, AppError> {
    let technology = Technology::get(&state.pool, id).await?;
    Ok(Json(technology))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateTechnology>,
) -> Result<impl IntoResponse, AppError> {
    let technology = Technology::create(&state.pool, input).await?;
    Ok((StatusCode::CREATED, Json(technology)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateTechnology>,
) -> Result<Json<Technology>, AppError> {
    let technology = Technology::update(&state.pool, id, input).await?;
    Ok(Json(technology))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    Technology::delete(&state.pool, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    pub limit: Option<i64>,
}

pub async fn trends(
    State(state): State<AppState>,
    Query(query): Query<TrendsQuery>,
) -> Result<Json<Vec<TechTrend>>, AppError> {
    let trends = Technology::trends(&state.pool, query.limit.unwrap_or(20).min(100)).await?;
    Ok(Json(trends))
}

pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<Vec<TechnologyWithStats>>, AppError> {
    let stats = Technology::stats(&state.pool).await?;
    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

/// Run the technology extractor over submitted free text.
pub async fn extract(
    State(state): State<AppState>,
    Json(input): Json<ExtractRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let names = state.catalog.extract_names(&input.text);
    Ok(Json(serde_json::json!({ "technologies": names })))
}
