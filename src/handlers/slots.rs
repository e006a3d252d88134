use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Local;
use serde::Deserialize;

use super::check_auth;
use crate::errors::AppError;
use crate::models::SlotCheckResult;
use crate::services::slots;
use crate::state::AppState;
use crate::timefmt;

// GET /api/slots
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub patient_guid: String,
    /// "MM/DD/YYYY"
    pub date: String,
    /// The originally requested slot string, for intended-slot highlighting.
    pub intended: Option<String>,
    /// Narrows alternatives to the chair/column of the original booking.
    pub schedule_view_guid: Option<String>,
}

pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotCheckResult>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let date = timefmt::parse_date(&query.date).ok_or_else(|| {
        AppError::BadRequest(format!("date must be MM/DD/YYYY, got {:?}", query.date))
            .into_response()
    })?;

    // Slot strings are clinic-local display times, so the today-filter
    // runs on the local wall clock.
    let now = Local::now().naive_local();

    let result = slots::check_availability(
        state.scheduling.as_ref(),
        &query.patient_guid,
        date,
        query.intended.as_deref(),
        query.schedule_view_guid.as_deref(),
        now,
    )
    .await;

    Ok(Json(result))
}
