use crate::models::{
    BookingIntent, BookingReportEntry, ChildComparison, ChildMatchStatus, CurrentBookingChild,
    IntentDeliveryComparison, OverallStatus, TransferComparison, TransferOutcome, TransferStatus,
};
use crate::timefmt;

/// Cross-checks each child's requested outcome against what was actually
/// delivered. Pure aggregation: identical inputs always yield identical
/// output.
pub fn compare(
    intents: &[BookingIntent],
    report: &[BookingReportEntry],
    current_children: &[CurrentBookingChild],
    transfer: Option<&TransferOutcome>,
) -> IntentDeliveryComparison {
    let children: Vec<ChildComparison> = intents
        .iter()
        .map(|intent| compare_child(intent, report, current_children))
        .collect();

    let transfer = transfer.map(|t| TransferComparison {
        requested: t.requested,
        delivered: t.delivered,
        status: if !t.requested || t.delivered {
            TransferStatus::Match
        } else {
            TransferStatus::Mismatch
        },
    });

    let overall_status = aggregate(&children, transfer.as_ref());

    IntentDeliveryComparison {
        children,
        transfer,
        overall_status,
    }
}

fn compare_child(
    intent: &BookingIntent,
    report: &[BookingReportEntry],
    current_children: &[CurrentBookingChild],
) -> ChildComparison {
    let entry = report
        .iter()
        .find(|e| e.child_name.trim().eq_ignore_ascii_case(intent.child_name.trim()));

    let entry = match entry {
        Some(entry) => entry,
        None => {
            return ChildComparison {
                child_name: intent.child_name.clone(),
                status: ChildMatchStatus::NotAttempted,
                requested_date: intent.requested_date.clone(),
                delivered_slot: None,
                note: Some("no booking attempt found in the call report".to_string()),
            };
        }
    };

    // The delivered outcome is whatever the scheduling system has live,
    // not what the report claims.
    let delivered_slot = entry.patient_guid.as_deref().and_then(|guid| {
        current_children
            .iter()
            .find(|c| c.patient_guid == guid)
            .and_then(|c| c.appointments.iter().find(|a| !a.is_cancelled()))
            .map(|a| a.date_time.clone())
    });

    let (status, note) = if let Some(err) = &entry.error {
        (ChildMatchStatus::Failed, Some(err.clone()))
    } else if entry.queued && !entry.booked && delivered_slot.is_none() {
        (
            ChildMatchStatus::Queued,
            Some("booking deferred to the async queue".to_string()),
        )
    } else if let Some(slot) = &delivered_slot {
        match &intent.requested_date {
            Some(wanted) if !delivered_on_date(slot, wanted) => (
                ChildMatchStatus::DateMismatch,
                Some(format!("requested {wanted}, got {slot}")),
            ),
            _ => (ChildMatchStatus::Match, None),
        }
    } else {
        (
            ChildMatchStatus::Failed,
            Some("no appointment could be confirmed".to_string()),
        )
    };

    ChildComparison {
        child_name: intent.child_name.clone(),
        status,
        requested_date: intent.requested_date.clone(),
        delivered_slot,
        note,
    }
}

fn delivered_on_date(slot: &str, requested_date: &str) -> bool {
    match (timefmt::parse_slot(slot), timefmt::parse_date(requested_date)) {
        (Some(dt), Some(date)) => dt.date() == date,
        // Unparsable on either side: fall back to a prefix check on the
        // raw strings rather than declaring a mismatch.
        _ => slot.starts_with(requested_date.trim()),
    }
}

fn aggregate(
    children: &[ChildComparison],
    transfer: Option<&TransferComparison>,
) -> OverallStatus {
    let transfer_mismatch = transfer.is_some_and(|t| t.status == TransferStatus::Mismatch);

    let any_blocking = transfer_mismatch
        || children.iter().any(|c| {
            matches!(
                c.status,
                ChildMatchStatus::Failed | ChildMatchStatus::DateMismatch
            )
        });
    if any_blocking {
        return OverallStatus::Mismatch;
    }

    let all_match = children
        .iter()
        .all(|c| c.status == ChildMatchStatus::Match);
    if all_match {
        return OverallStatus::Match;
    }

    // Only non-blocking issues remain (queued / not attempted). Pending
    // when nothing matched yet, partial when some children already did.
    if children.iter().any(|c| c.status == ChildMatchStatus::Match) {
        OverallStatus::Partial
    } else {
        OverallStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduledAppointment;

    fn intent(name: &str, date: Option<&str>) -> BookingIntent {
        BookingIntent {
            child_name: name.to_string(),
            requested_appt_name: Some("Adjustment".to_string()),
            requested_date: date.map(|s| s.to_string()),
        }
    }

    fn entry(name: &str, guid: Option<&str>, booked: bool) -> BookingReportEntry {
        BookingReportEntry {
            child_name: name.to_string(),
            patient_guid: guid.map(|s| s.to_string()),
            slot: Some("01/15/2025 10:00 AM".to_string()),
            schedule_view_guid: None,
            appointment_type_guid: None,
            booked,
            queued: false,
            error: None,
        }
    }

    fn child_with_appt(guid: &str, date_time: &str, status: &str) -> CurrentBookingChild {
        CurrentBookingChild {
            patient_guid: guid.to_string(),
            name: "Alice".to_string(),
            dob: None,
            appointments: vec![ScheduledAppointment {
                appointment_guid: "a1".to_string(),
                date_time: date_time.to_string(),
                status: status.to_string(),
                appt_type: None,
            }],
        }
    }

    #[test]
    fn test_everything_delivered_is_overall_match() {
        let intents = vec![intent("Alice", Some("01/15/2025"))];
        let report = vec![entry("Alice", Some("p1"), true)];
        let children = vec![child_with_appt("p1", "01/15/2025 10:00 AM", "Scheduled")];

        let result = compare(&intents, &report, &children, None);
        assert_eq!(result.overall_status, OverallStatus::Match);
        assert_eq!(result.children[0].status, ChildMatchStatus::Match);
        assert_eq!(
            result.children[0].delivered_slot.as_deref(),
            Some("01/15/2025 10:00 AM")
        );
    }

    #[test]
    fn test_missing_report_entry_is_not_attempted() {
        let intents = vec![intent("Bob", None)];
        let result = compare(&intents, &[], &[], None);
        assert_eq!(result.children[0].status, ChildMatchStatus::NotAttempted);
        assert_eq!(result.overall_status, OverallStatus::Pending);
    }

    #[test]
    fn test_date_mismatch_detected() {
        let intents = vec![intent("Alice", Some("01/16/2025"))];
        let report = vec![entry("Alice", Some("p1"), true)];
        let children = vec![child_with_appt("p1", "01/15/2025 10:00 AM", "Scheduled")];

        let result = compare(&intents, &report, &children, None);
        assert_eq!(result.children[0].status, ChildMatchStatus::DateMismatch);
        assert_eq!(result.overall_status, OverallStatus::Mismatch);
    }

    #[test]
    fn test_no_requested_date_counts_as_match_when_booked() {
        let intents = vec![intent("Alice", None)];
        let report = vec![entry("Alice", Some("p1"), true)];
        let children = vec![child_with_appt("p1", "01/20/2025 2:00 PM", "Scheduled")];

        let result = compare(&intents, &report, &children, None);
        assert_eq!(result.children[0].status, ChildMatchStatus::Match);
    }

    #[test]
    fn test_report_error_is_failed() {
        let intents = vec![intent("Alice", Some("01/15/2025"))];
        let mut e = entry("Alice", Some("p1"), false);
        e.error = Some("patient lookup timed out".to_string());

        let result = compare(&intents, &[e], &[], None);
        assert_eq!(result.children[0].status, ChildMatchStatus::Failed);
        assert_eq!(result.overall_status, OverallStatus::Mismatch);
    }

    #[test]
    fn test_booked_claim_without_live_appointment_is_failed() {
        let intents = vec![intent("Alice", Some("01/15/2025"))];
        let report = vec![entry("Alice", Some("p1"), true)];
        let children = vec![child_with_appt("p1", "01/15/2025 10:00 AM", "Cancelled")];

        let result = compare(&intents, &report, &children, None);
        assert_eq!(result.children[0].status, ChildMatchStatus::Failed);
    }

    #[test]
    fn test_queued_entry_is_queued() {
        let intents = vec![intent("Alice", Some("01/15/2025"))];
        let mut e = entry("Alice", None, false);
        e.queued = true;

        let result = compare(&intents, &[e], &[], None);
        assert_eq!(result.children[0].status, ChildMatchStatus::Queued);
        assert_eq!(result.overall_status, OverallStatus::Pending);
    }

    #[test]
    fn test_one_failed_child_forces_mismatch() {
        let intents = vec![
            intent("Alice", Some("01/15/2025")),
            intent("Bob", Some("01/15/2025")),
        ];
        let mut bob = entry("Bob", None, false);
        bob.error = Some("no slots".to_string());
        let report = vec![entry("Alice", Some("p1"), true), bob];
        let children = vec![child_with_appt("p1", "01/15/2025 10:00 AM", "Scheduled")];

        let result = compare(&intents, &report, &children, None);
        assert_eq!(result.overall_status, OverallStatus::Mismatch);
    }

    #[test]
    fn test_mixed_match_and_queued_is_partial() {
        let intents = vec![
            intent("Alice", Some("01/15/2025")),
            intent("Bob", None),
        ];
        let mut bob = entry("Bob", None, false);
        bob.queued = true;
        let report = vec![entry("Alice", Some("p1"), true), bob];
        let children = vec![child_with_appt("p1", "01/15/2025 10:00 AM", "Scheduled")];

        let result = compare(&intents, &report, &children, None);
        assert_eq!(result.overall_status, OverallStatus::Partial);
    }

    #[test]
    fn test_transfer_requested_but_not_delivered_is_mismatch() {
        let intents = vec![intent("Alice", Some("01/15/2025"))];
        let report = vec![entry("Alice", Some("p1"), true)];
        let children = vec![child_with_appt("p1", "01/15/2025 10:00 AM", "Scheduled")];
        let transfer = TransferOutcome {
            requested: true,
            delivered: false,
        };

        let result = compare(&intents, &report, &children, Some(&transfer));
        assert_eq!(result.overall_status, OverallStatus::Mismatch);

        let delivered = TransferOutcome {
            requested: true,
            delivered: true,
        };
        let result = compare(&intents, &report, &children, Some(&delivered));
        assert_eq!(result.overall_status, OverallStatus::Match);
    }

    #[test]
    fn test_name_join_tolerates_whitespace_and_case_on_both_sides() {
        let intents = vec![intent("alice", Some("01/15/2025"))];
        // LLM-produced report names can carry stray whitespace.
        let report = vec![entry("  Alice ", Some("p1"), true)];
        let children = vec![child_with_appt("p1", "01/15/2025 10:00 AM", "Scheduled")];

        let result = compare(&intents, &report, &children, None);
        assert_eq!(result.children[0].status, ChildMatchStatus::Match);
        assert_eq!(result.overall_status, OverallStatus::Match);
    }

    #[test]
    fn test_compare_is_deterministic() {
        let intents = vec![intent("Alice", Some("01/15/2025")), intent("Bob", None)];
        let report = vec![entry("Alice", Some("p1"), true)];
        let children = vec![child_with_appt("p1", "01/15/2025 10:00 AM", "Scheduled")];

        let a = compare(&intents, &report, &children, None);
        let b = compare(&intents, &report, &children, None);
        assert_eq!(a.overall_status, b.overall_status);
        assert_eq!(a.children.len(), b.children.len());
        for (x, y) in a.children.iter().zip(b.children.iter()) {
            assert_eq!(x.status, y.status);
        }
    }
}
