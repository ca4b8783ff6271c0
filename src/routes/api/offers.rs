use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::error::AppError;
use crate::models::offer::{CreateOffer, Offer, OfferFilters, OfferWithTechnologies, UpdateOffer};
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<OfferFilters>,
) -> Result<Json<Vec<OfferWithTechnologies>>, AppError> {
    let offers = Offer::list(&state.pool, &filters).await?;
    let mut result = Vec::with_capacity(offers.len());
    for offer in offers {
        result.push(offer.with_technologies(&state.pool).await?);
    }
    Ok(Json(result))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OfferWithTechnologies>, AppError> {
    let offer = Offer::get(&state.pool, id).await?;
    Ok(Json(offer.with_technologies(&state.pool).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateOffer>,
) -> Result<impl IntoResponse, AppError> {
    let offer = Offer::create(&state.pool, input).await?;
    let with_techs = offer.with_technologies(&state.pool).await?;
    Ok((StatusCode::CREATED, Json(with_techs)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateOffer>,
) -> Result<Json<OfferWithTechnologies>, AppError> {
    let offer = Offer::update(&state.pool, id, input).await?;
    Ok(Json(offer.with_technologies(&state.pool).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    Offer::delete(&state.pool, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
