use serde::{Deserialize, Serialize};

/// Per-child requested outcome, as extracted by the (external) intent
/// classifier from the call transcript. Read-only input to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingIntent {
    pub child_name: String,
    #[serde(default)]
    pub requested_appt_name: Option<String>,
    /// "MM/DD/YYYY", when the caller named a date at all.
    #[serde(default)]
    pub requested_date: Option<String>,
}

/// Whether the caller asked to be transferred to a human, and whether the
/// agent actually did it. Optional side-channel to the comparator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub requested: bool,
    #[serde(default)]
    pub delivered: bool,
}
