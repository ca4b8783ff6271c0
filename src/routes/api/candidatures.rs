use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::error::AppError;
use crate::models::candidature::{
    Candidature, CandidatureFilters, CreateCandidature, UpdateCandidature,
};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<CandidatureFilters>,
) -> Result<Json<Vec<Candidature>>, AppError> {
    let candidatures = Candidature::list(&state.pool, &filters).await?;
    Ok(Json(candidatures))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Candidature>, AppError> {
    let candidature = Candidature::get(&state.pool, id).await?;
    Ok(Json(candidature))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateCandidature>,
) -> Result<impl IntoResponse, AppError> {
    let candidature = Candidature::create(&state.pool, input).await?;
    Ok((StatusCode::CREATED, Json(candidature)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateCandidature>,
) -> Result<Json<Candidature>, AppError> {
    let candidature = Candidature::update(&state.pool, id, input).await?;
    Ok(Json(candidature))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    Candidature::delete(&state.pool, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
