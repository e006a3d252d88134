use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use super::check_auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{CorrectionAction, CorrectionProposal, CorrectionRecord, CorrectionResult};
use crate::state::AppState;

// POST /api/corrections/propose
#[derive(Deserialize)]
pub struct ProposeRequest {
    pub session_id: String,
    pub action: CorrectionAction,
}

pub async fn propose(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ProposeRequest>,
) -> Result<Json<CorrectionProposal>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let proposal = state.orchestrator.propose(&req.session_id, req.action);
    Ok(Json(proposal))
}

// POST /api/corrections/:id/confirm
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CorrectionResult>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let result = state.orchestrator.confirm(&id).await;
    Ok(Json(result))
}

// POST /api/corrections/:id/discard
pub async fn discard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    if !state.orchestrator.discard(&id) {
        return Err(AppError::NotFound(format!("proposal {id}")).into_response());
    }
    Ok(Json(serde_json::json!({ "discarded": true })))
}

// GET /api/corrections/history
#[derive(Deserialize)]
pub struct HistoryQuery {
    pub session_id: String,
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<CorrectionRecord>>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let records = {
        let db = state.db.lock().unwrap();
        queries::get_correction_history(&db, &query.session_id).map_err(|e| {
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        })?
    };

    Ok(Json(records))
}
