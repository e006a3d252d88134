pub mod http;

use async_trait::async_trait;

use crate::models::{CurrentBookingChild, SlotAlternative};

/// What the orchestrator sends to the scheduling system to create an
/// appointment. Dates are canonicalized to "MM/DD/YYYY h:mm AM/PM" before
/// this point; everything else passes through unmodified.
#[derive(Debug, Clone)]
pub struct CreateAppointmentRequest {
    pub patient_guid: String,
    pub start_time: String,
    pub schedule_view_guid: String,
    pub schedule_column_guid: String,
    pub appointment_type_guid: String,
}

/// Boundary to the external scheduling system. The remote system is the
/// single source of truth for schedule state; implementations do not cache.
#[async_trait]
pub trait SchedulingSystem: Send + Sync {
    async fn get_appointments_by_patient(
        &self,
        patient_guid: &str,
    ) -> anyhow::Result<CurrentBookingChild>;

    /// `schedule_view_guid`, when supplied, narrows results to the same
    /// chair/column as the original booking.
    async fn get_available_slots(
        &self,
        date: &str,
        patient_guid: &str,
        schedule_view_guid: Option<&str>,
    ) -> anyhow::Result<Vec<SlotAlternative>>;

    /// Returns the new appointment GUID.
    async fn create_appointment(&self, req: &CreateAppointmentRequest) -> anyhow::Result<String>;

    async fn cancel_appointment(&self, appointment_guid: &str) -> anyhow::Result<()>;
}
