use crate::models::{
    BookingReportEntry, CorrectionStatus, CurrentBookingChild, ScheduledAppointment,
};

#[derive(Debug, Clone)]
pub struct Classification {
    pub status: CorrectionStatus,
    pub matched_child: Option<CurrentBookingChild>,
    pub matched_appointment: Option<ScheduledAppointment>,
}

impl Classification {
    fn status_only(status: CorrectionStatus) -> Self {
        Self {
            status,
            matched_child: None,
            matched_appointment: None,
        }
    }
}

/// Derives what correction (if any) a report entry needs, given the live
/// schedule. Deterministic and side-effect free.
///
/// Identity resolution comes first; the report's own booked/queued flags
/// are only trusted when a live, non-cancelled appointment corroborates
/// them. When several scheduled appointments exist the first in the
/// child's list is treated as canonical.
pub fn classify(
    report: &BookingReportEntry,
    current_children: &[CurrentBookingChild],
) -> Classification {
    let matched = report.patient_guid.as_deref().and_then(|guid| {
        current_children.iter().find(|c| c.patient_guid == guid)
    });

    let child = match matched {
        Some(child) => child,
        None => {
            if report.patient_guid.is_some() {
                // Identity is known but nothing is on record for it.
                return Classification::status_only(CorrectionStatus::NeedsBooking);
            }
            let status = if report.booked || report.queued {
                CorrectionStatus::NeedsBooking
            } else {
                CorrectionStatus::NoRecord
            };
            return Classification::status_only(status);
        }
    };

    let (scheduled, cancelled): (Vec<_>, Vec<_>) = child
        .appointments
        .iter()
        .partition(|a| !a.is_cancelled());

    let status = if report.booked && !scheduled.is_empty() {
        CorrectionStatus::Booked
    } else if report.queued && !scheduled.is_empty() {
        CorrectionStatus::QueuedBooked
    } else if report.booked && !cancelled.is_empty() && scheduled.is_empty() {
        CorrectionStatus::WasCancelled
    } else if (report.queued && !report.booked) || (report.booked && scheduled.is_empty()) {
        CorrectionStatus::NeedsBooking
    } else if child.appointments.is_empty() {
        CorrectionStatus::NeedsBooking
    } else {
        CorrectionStatus::NoRecord
    };

    let matched_appointment = match status {
        CorrectionStatus::Booked | CorrectionStatus::QueuedBooked => {
            scheduled.first().map(|a| (*a).clone())
        }
        CorrectionStatus::WasCancelled => cancelled.first().map(|a| (*a).clone()),
        _ => None,
    };

    Classification {
        status,
        matched_child: Some(child.clone()),
        matched_appointment,
    }
}
