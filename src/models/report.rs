use serde::{Deserialize, Serialize};

/// Per-child booking outcome as the agent believed it during the call.
/// Produced by the external call-report generator from loosely-shaped LLM
/// output, so every field that can be absent is an Option with a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReportEntry {
    pub child_name: String,
    /// Absent when patient lookup never completed during the call.
    #[serde(default)]
    pub patient_guid: Option<String>,
    /// "MM/DD/YYYY h:mm AM/PM" — the time the agent told the caller.
    #[serde(default)]
    pub slot: Option<String>,
    #[serde(default)]
    pub schedule_view_guid: Option<String>,
    #[serde(default)]
    pub appointment_type_guid: Option<String>,
    #[serde(default)]
    pub booked: bool,
    /// Booking was deferred to an async queue rather than confirmed live.
    #[serde(default)]
    pub queued: bool,
    #[serde(default)]
    pub error: Option<String>,
}
