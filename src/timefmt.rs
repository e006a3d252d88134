use chrono::{NaiveDate, NaiveDateTime};

/// Canonical request formats for the scheduling system: "MM/DD/YYYY" for
/// dates, "MM/DD/YYYY h:mm AM/PM" for slot times (hour not zero-padded).
const DATE_FMT: &str = "%m/%d/%Y";
const SLOT_PARSE_FMT: &str = "%m/%d/%Y %I:%M %p";
const SLOT_DISPLAY_FMT: &str = "%m/%d/%Y %-I:%M %p";

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FMT).ok()
}

pub fn parse_slot(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), SLOT_PARSE_FMT).ok()
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

pub fn format_slot(dt: NaiveDateTime) -> String {
    dt.format(SLOT_DISPLAY_FMT).to_string()
}
