use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::models::import_run::ImportRun;
use crate::sources::import::{import_from_all_sources, import_from_source};
use crate::sources::{ContractType, SearchCriteria, SourceAdapter};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    pub keywords: Option<String>,
    pub location: Option<String>,
    pub contract_type: Option<ContractType>,
    pub max_offers: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ImportAllQuery {
    pub keywords: Option<String>,
    pub location: Option<String>,
    pub max_offers_per_source: Option<usize>,
}

/// POST /api/imports/{source} — fire-and-forget import job for one
/// source. 503 when its credentials are missing (precondition, not a
/// runtime race).
pub async fn import_source(
    State(state): State<AppState>,
    Path(source): Path<String>,
    Query(query): Query<ImportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let adapter = state
        .sources
        .get(&source)
        .ok_or_else(|| AppError::NotFound(format!("Unknown source '{source}'")))?;
    if !adapter.is_configured() {
        return Err(AppError::SourceNotConfigured(source));
    }

    let run = ImportRun::enqueue(&state.pool, adapter.name()).await?;
    let criteria = SearchCriteria {
        keywords: query.keywords,
        location: query.location,
        contract_type: query.contract_type,
    };
    let max_offers = query.max_offers.unwrap_or(50);

    tokio::spawn(run_single_import(
        state.clone(),
        adapter,
        run.id,
        criteria,
        max_offers,
    ));

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": format!("Import from '{source}' started in the background"),
            "run_id": run.id,
        })),
    ))
}

async fn run_single_import(
    state: AppState,
    adapter: Arc<dyn SourceAdapter>,
    run_id: i32,
    criteria: SearchCriteria,
    max_offers: usize,
) {
    let _ = ImportRun::mark_running(&state.pool, run_id).await;
    match import_from_source(
        &state.pool,
        adapter.as_ref(),
        &state.catalog,
        &criteria,
        max_offers,
    )
    .await
    {
        Ok(report) => {
            tracing::info!(
                source = adapter.name(),
                "Import finished: {} fetched, {} new",
                report.fetched,
                report.imported
            );
            let _ = ImportRun::mark_succeeded(
                &state.pool,
                run_id,
                Some(report.fetched as i32),
                report.imported as i32,
            )
            .await;
        }
        Err(e) => {
            tracing::error!(source = adapter.name(), "Import failed: {e}");
            let _ = ImportRun::mark_failed(&state.pool, run_id, &e.to_string()).await;
        }
    }
}

/// POST /api/imports/all — one background job covering every configured
/// source.
pub async fn import_all(
    State(state): State<AppState>,
    Query(query): Query<ImportAllQuery>,
) -> Result<impl IntoResponse, AppError> {
    let adapters = state.sources.configured();
    if adapters.is_empty() {
        return Err(AppError::SourceNotConfigured("all".to_string()));
    }

    let run = ImportRun::enqueue(&state.pool, "all").await?;
    let run_id = run.id;
    let criteria = SearchCriteria {
        keywords: query.keywords,
        location: query.location,
        contract_type: None,
    };
    let max_offers_per_source = query.max_offers_per_source.unwrap_or(30);

    tokio::spawn(async move {
        let _ = ImportRun::mark_running(&state.pool, run_id).await;
        let results = import_from_all_sources(
            &state.pool,
            &adapters,
            &state.catalog,
            &criteria,
            max_offers_per_source,
        )
        .await;
        let imported: usize = results.values().sum();
        tracing::info!("Import from all sources finished: {results:?}");
        let _ = ImportRun::mark_succeeded(&state.pool, run_id, None, imported as i32).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "message": "Import from all configured sources started in the background",
            "run_id": run_id,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RunsQuery {
    pub source: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/imports/runs — recent import jobs for the audit trail.
pub async fn runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<Vec<ImportRun>>, AppError> {
    let runs = ImportRun::recent(
        &state.pool,
        query.source.as_deref(),
        query.limit.unwrap_or(50).min(200),
    )
    .await?;
    Ok(Json(runs))
}
