use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Discrepancy classification for one report entry against the live
/// schedule. Closed set; the dashboard renders these verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStatus {
    /// Intent/report exists but nothing non-cancelled is on record.
    NeedsBooking,
    /// Report says booked and a live non-cancelled appointment corroborates it.
    Booked,
    /// Report says booked but every matching appointment is cancelled.
    WasCancelled,
    /// Report says queued and the async queue has since completed.
    QueuedBooked,
    /// No patient identity resolved and no booking was attempted.
    NoRecord,
}

impl CorrectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionStatus::NeedsBooking => "needs_booking",
            CorrectionStatus::Booked => "booked",
            CorrectionStatus::WasCancelled => "was_cancelled",
            CorrectionStatus::QueuedBooked => "queued_booked",
            CorrectionStatus::NoRecord => "no_record",
        }
    }
}

/// A corrective write against the scheduling system, as proposed to (and
/// confirmed by) the reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrectionAction {
    Book {
        patient_guid: String,
        #[serde(default)]
        child_name: Option<String>,
        /// "MM/DD/YYYY h:mm AM/PM"
        start_time: String,
        schedule_view_guid: String,
        schedule_column_guid: String,
        appointment_type_guid: String,
    },
    Cancel {
        appointment_guid: String,
        #[serde(default)]
        patient_guid: Option<String>,
        #[serde(default)]
        child_name: Option<String>,
    },
    Reschedule {
        old_appointment_guid: String,
        patient_guid: String,
        #[serde(default)]
        child_name: Option<String>,
        new_start_time: String,
        schedule_view_guid: String,
        schedule_column_guid: String,
        appointment_type_guid: String,
    },
}

impl CorrectionAction {
    pub fn kind(&self) -> &'static str {
        match self {
            CorrectionAction::Book { .. } => "book",
            CorrectionAction::Cancel { .. } => "cancel",
            CorrectionAction::Reschedule { .. } => "reschedule",
        }
    }

    pub fn child_name(&self) -> Option<&str> {
        match self {
            CorrectionAction::Book { child_name, .. }
            | CorrectionAction::Cancel { child_name, .. }
            | CorrectionAction::Reschedule { child_name, .. } => child_name.as_deref(),
        }
    }

    /// Serialization key for at-most-one-in-flight-per-child: patient GUID
    /// when known, child name otherwise.
    pub fn child_key(&self) -> String {
        let guid = match self {
            CorrectionAction::Book { patient_guid, .. } => Some(patient_guid.as_str()),
            CorrectionAction::Cancel { patient_guid, .. } => patient_guid.as_deref(),
            CorrectionAction::Reschedule { patient_guid, .. } => Some(patient_guid.as_str()),
        };
        guid.or_else(|| self.child_name())
            .unwrap_or("unknown")
            .to_string()
    }
}

/// Outcome of one corrective attempt. Failures are values, not errors;
/// nothing past the orchestrator boundary throws.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub appointment_guid: Option<String>,
}

impl CorrectionResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            appointment_guid: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Success,
    Failure,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Success => "success",
            RecordStatus::Failure => "failure",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "success" => RecordStatus::Success,
            _ => RecordStatus::Failure,
        }
    }
}

/// Append-only audit entry. Exactly one per completed corrective attempt,
/// including failed ones; never edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionRecord {
    pub id: String,
    pub session_id: String,
    pub action: String,
    #[serde(default)]
    pub child_name: Option<String>,
    #[serde(default)]
    pub slot_after: Option<String>,
    #[serde(default)]
    pub appointment_guid_after: Option<String>,
    pub status: RecordStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub performed_at: NaiveDateTime,
}

/// Two-step confirm gate: a proposal is created first, then explicitly
/// confirmed before any network call goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    Proposed,
    Confirmed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionProposal {
    pub id: String,
    pub session_id: String,
    pub action: CorrectionAction,
    pub state: ProposalState,
    pub created_at: NaiveDateTime,
}
