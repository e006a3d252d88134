use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::{GroupedSlots, SlotAlternative, SlotCheckResult};
use crate::services::scheduling::SchedulingSystem;
use crate::timefmt;

/// Slots starting within this many minutes of now are treated as already
/// passed when viewing today's schedule.
const PAST_SLOT_BUFFER_MIN: i64 = 5;

/// Drops effectively-past slots (today only) and splits the rest into
/// morning/afternoon for presentation.
///
/// Slots whose start time fails to parse are kept; unparsable data is
/// surfaced, never silently dropped. AM/PM grouping goes by the literal
/// "PM" in the display string because that is what the upstream format
/// guarantees, not a numeric hour.
pub fn filter_and_group(
    slots: Vec<SlotAlternative>,
    viewing_date: NaiveDate,
    now: NaiveDateTime,
) -> GroupedSlots {
    let cutoff = if viewing_date == now.date() {
        Some(now + Duration::minutes(PAST_SLOT_BUFFER_MIN))
    } else {
        None
    };

    let mut grouped = GroupedSlots::default();

    for slot in slots {
        if let (Some(cutoff), Some(start)) = (cutoff, timefmt::parse_slot(&slot.start_time)) {
            if start < cutoff {
                grouped.hidden_past_count += 1;
                continue;
            }
        }

        if slot.start_time.contains("PM") {
            grouped.afternoon.push(slot);
        } else {
            grouped.morning.push(slot);
        }
    }

    grouped
}

/// Queries the scheduling system for open slots and marks the one (if any)
/// whose start time equals the originally requested slot string byte for
/// byte. Always a fresh query: availability is time-sensitive, so nothing
/// is cached across calls. Remote failures come back as `success: false`
/// with empty groups.
pub async fn check_availability(
    scheduling: &dyn SchedulingSystem,
    patient_guid: &str,
    date: NaiveDate,
    intended_start_time: Option<&str>,
    schedule_view_guid: Option<&str>,
    now: NaiveDateTime,
) -> SlotCheckResult {
    let date_str = timefmt::format_date(date);

    let slots = match scheduling
        .get_available_slots(&date_str, patient_guid, schedule_view_guid)
        .await
    {
        Ok(slots) => slots,
        Err(e) => {
            tracing::warn!(patient_guid, date = %date_str, error = %e, "slot query failed");
            return SlotCheckResult {
                success: false,
                message: Some(format!("slot lookup failed: {e}")),
                intended_slot: None,
                alternatives: GroupedSlots::default(),
            };
        }
    };

    let intended_slot = intended_start_time.and_then(|wanted| {
        slots.iter().find(|s| s.start_time == wanted).cloned()
    });

    SlotCheckResult {
        success: true,
        message: None,
        intended_slot,
        alternatives: filter_and_group(slots, date, now),
    }
}
