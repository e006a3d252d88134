use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{CreateAppointmentRequest, SchedulingSystem};
use crate::models::{CurrentBookingChild, ScheduledAppointment, SlotAlternative};

/// reqwest client for the practice-management scheduling API.
pub struct HttpSchedulingClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpSchedulingClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct AppointmentRow {
    #[serde(rename = "AppointmentGUID")]
    appointment_guid: String,
    #[serde(rename = "StartTime")]
    start_time: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "AppointmentType")]
    appt_type: Option<String>,
}

#[derive(Deserialize)]
struct PatientResponse {
    #[serde(rename = "PatientGUID")]
    patient_guid: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "BirthDate")]
    dob: Option<String>,
    #[serde(rename = "Appointments", default)]
    appointments: Vec<AppointmentRow>,
}

#[derive(Deserialize)]
struct SlotRow {
    #[serde(rename = "StartTime")]
    start_time: String,
    #[serde(rename = "ScheduleViewGUID")]
    schedule_view_guid: String,
    #[serde(rename = "ScheduleColumnGUID")]
    schedule_column_guid: String,
    #[serde(rename = "AppointmentTypeGUID")]
    appointment_type_guid: String,
    #[serde(rename = "ChairName")]
    chair_name: Option<String>,
}

#[derive(Deserialize)]
struct CreateResponse {
    #[serde(rename = "AppointmentGUID")]
    appointment_guid: String,
}

#[async_trait]
impl SchedulingSystem for HttpSchedulingClient {
    async fn get_appointments_by_patient(
        &self,
        patient_guid: &str,
    ) -> anyhow::Result<CurrentBookingChild> {
        let url = format!("{}/patients/{}/appointments", self.base_url, patient_guid);

        let resp: PatientResponse = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("failed to query patient appointments")?
            .error_for_status()
            .context("scheduling API rejected appointment query")?
            .json()
            .await
            .context("failed to parse patient appointments response")?;

        Ok(CurrentBookingChild {
            patient_guid: resp.patient_guid,
            name: resp.name,
            dob: resp.dob,
            appointments: resp
                .appointments
                .into_iter()
                .map(|a| ScheduledAppointment {
                    appointment_guid: a.appointment_guid,
                    date_time: a.start_time,
                    status: a.status,
                    appt_type: a.appt_type,
                })
                .collect(),
        })
    }

    async fn get_available_slots(
        &self,
        date: &str,
        patient_guid: &str,
        schedule_view_guid: Option<&str>,
    ) -> anyhow::Result<Vec<SlotAlternative>> {
        let url = format!("{}/slots", self.base_url);
        let mut query = vec![("date", date), ("patientGUID", patient_guid)];
        if let Some(view) = schedule_view_guid {
            query.push(("scheduleViewGUID", view));
        }

        let rows: Vec<SlotRow> = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(&query)
            .send()
            .await
            .context("failed to query available slots")?
            .error_for_status()
            .context("scheduling API rejected slot query")?
            .json()
            .await
            .context("failed to parse slot response")?;

        Ok(rows
            .into_iter()
            .map(|s| SlotAlternative {
                start_time: s.start_time,
                schedule_view_guid: s.schedule_view_guid,
                schedule_column_guid: s.schedule_column_guid,
                appointment_type_guid: s.appointment_type_guid,
                chair_name: s.chair_name,
            })
            .collect())
    }

    async fn create_appointment(&self, req: &CreateAppointmentRequest) -> anyhow::Result<String> {
        let url = format!("{}/appointments", self.base_url);
        let body = json!({
            "PatientGUID": req.patient_guid,
            "StartTime": req.start_time,
            "ScheduleViewGUID": req.schedule_view_guid,
            "ScheduleColumnGUID": req.schedule_column_guid,
            "AppointmentTypeGUID": req.appointment_type_guid,
        });

        let resp: CreateResponse = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to create appointment")?
            .error_for_status()
            .context("scheduling API rejected appointment creation")?
            .json()
            .await
            .context("failed to parse appointment creation response")?;

        Ok(resp.appointment_guid)
    }

    async fn cancel_appointment(&self, appointment_guid: &str) -> anyhow::Result<()> {
        let url = format!("{}/appointments/{}", self.base_url, appointment_guid);

        self.client
            .delete(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("failed to cancel appointment")?
            .error_for_status()
            .context("scheduling API rejected cancellation")?;

        Ok(())
    }
}
