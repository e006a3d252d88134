use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::check_auth;
use crate::models::{
    BookingIntent, BookingReportEntry, CorrectionStatus, IntentDeliveryComparison,
    ScheduledAppointment, TransferOutcome,
};
use crate::services::{classifier, comparator};
use crate::state::AppState;

// POST /api/reconcile
#[derive(Deserialize)]
pub struct ReconcileRequest {
    pub session_id: String,
    #[serde(default)]
    pub intents: Vec<BookingIntent>,
    #[serde(default)]
    pub report: Vec<BookingReportEntry>,
    #[serde(default)]
    pub transfer: Option<TransferOutcome>,
}

#[derive(Serialize)]
pub struct ChildClassification {
    pub child_name: String,
    pub status: CorrectionStatus,
    pub patient_guid: Option<String>,
    pub matched_appointment: Option<ScheduledAppointment>,
}

#[derive(Serialize)]
pub struct ReconcileResponse {
    pub session_id: String,
    pub classifications: Vec<ChildClassification>,
    pub comparison: IntentDeliveryComparison,
}

pub async fn reconcile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ReconcileRequest>,
) -> Result<Json<ReconcileResponse>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let patient_guids: Vec<String> = req
        .report
        .iter()
        .filter_map(|e| e.patient_guid.clone())
        .collect();

    let current_children = state.orchestrator.current_children(&patient_guids).await;

    let classifications = req
        .report
        .iter()
        .map(|entry| {
            let result = classifier::classify(entry, &current_children);
            ChildClassification {
                child_name: entry.child_name.clone(),
                status: result.status,
                patient_guid: entry.patient_guid.clone(),
                matched_appointment: result.matched_appointment,
            }
        })
        .collect();

    let comparison = comparator::compare(
        &req.intents,
        &req.report,
        &current_children,
        req.transfer.as_ref(),
    );

    tracing::info!(session = %req.session_id, children = req.report.len(), "reconciled session");

    Ok(Json(ReconcileResponse {
        session_id: req.session_id,
        classifications,
        comparison,
    }))
}
