//! Route handlers

use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{SecondsFormat, Utc};
use ledger_core::{
    wire::{DataResponse, HealthResponse, ListResponse, ResetResponse},
    EventCandidate, LedgerEvent,
};
use serde_json::Value;
use tracing::{debug, info};

/// GET /api/ledger
pub async fn list_events(State(state): State<AppState>) -> Json<ListResponse> {
    let events = state.ledger.list();
    debug!(count = events.len(), "Listing ledger events");
    Json(ListResponse { events })
}

/// POST /api/ledger/append (and the legacy POST /api/ledger)
pub async fn append_event(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<DataResponse<LedgerEvent>>), ApiError> {
    let Json(body) = body?;
    let candidate = EventCandidate::from_json(body);

    let event = state.ledger.append(&candidate).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::ok(event))))
}

/// POST /api/ledger/reset
pub async fn reset_ledger(State(state): State<AppState>) -> Result<Json<ResetResponse>, ApiError> {
    info!("Resetting ledger to seed data");
    let events = state.ledger.reset().await?;
    Ok(Json(ResetResponse::new(events)))
}

/// GET /api/ledger/events/:id
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<LedgerEvent>>, ApiError> {
    let event = state.ledger.get_event(&id)?;
    Ok(Json(DataResponse::ok(event)))
}

/// GET /api/ledger/blocks/:number
pub async fn get_block(
    State(state): State<AppState>,
    number: Result<Path<u64>, PathRejection>,
) -> Result<Json<DataResponse<LedgerEvent>>, ApiError> {
    let Path(number) = number?;
    let event = state.ledger.get_by_block_number(number)?;
    Ok(Json(DataResponse::ok(event)))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> Result<String, ApiError> {
    state
        .ledger
        .metrics()
        .export()
        .map_err(|e| ApiError::Metrics(e.to_string()))
}
