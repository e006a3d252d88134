use serde::{Deserialize, Serialize};

/// One appointment as the scheduling system reports it. `status` is free
/// text; cancellation is detected as a case-insensitive "cancel" substring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledAppointment {
    pub appointment_guid: String,
    /// "MM/DD/YYYY h:mm AM/PM"
    pub date_time: String,
    pub status: String,
    #[serde(default)]
    pub appt_type: Option<String>,
}

impl ScheduledAppointment {
    pub fn is_cancelled(&self) -> bool {
        self.status.to_lowercase().contains("cancel")
    }
}

/// Ground-truth schedule state for one patient, fetched live. Never patched
/// incrementally: after any successful corrective write the whole thing is
/// refetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentBookingChild {
    pub patient_guid: String,
    pub name: String,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub appointments: Vec<ScheduledAppointment>,
}
