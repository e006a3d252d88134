use serde::{Deserialize, Serialize};

/// One bookable opening, exactly as the scheduling system returned it.
/// Never mutated after the adapter produces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotAlternative {
    /// "MM/DD/YYYY h:mm AM/PM"
    pub start_time: String,
    pub schedule_view_guid: String,
    pub schedule_column_guid: String,
    pub appointment_type_guid: String,
    #[serde(default)]
    pub chair_name: Option<String>,
}

/// Slot list partitioned for presentation. Grouping is driven by the
/// display string ("PM" substring), not by numeric hours, because the
/// upstream format is a formatted string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupedSlots {
    pub morning: Vec<SlotAlternative>,
    pub afternoon: Vec<SlotAlternative>,
    pub hidden_past_count: usize,
}

/// Outcome of an availability check. On remote failure `success` is false,
/// `message` says why, and the groups are left empty (never partially
/// populated).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotCheckResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Present when an open slot's start time matches the originally
    /// requested slot string byte for byte.
    #[serde(default)]
    pub intended_slot: Option<SlotAlternative>,
    pub alternatives: GroupedSlots,
}
