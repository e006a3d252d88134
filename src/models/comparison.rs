use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildMatchStatus {
    Match,
    DateMismatch,
    Failed,
    Queued,
    NotAttempted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildComparison {
    pub child_name: String,
    pub status: ChildMatchStatus,
    #[serde(default)]
    pub requested_date: Option<String>,
    /// The slot actually on record, when one could be confirmed.
    #[serde(default)]
    pub delivered_slot: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Match,
    Mismatch,
    Pending,
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Match,
    Mismatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferComparison {
    pub requested: bool,
    pub delivered: bool,
    pub status: TransferStatus,
}

/// Output of the intent-delivery comparator. Pure data; identical inputs
/// always produce identical output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentDeliveryComparison {
    pub children: Vec<ChildComparison>,
    #[serde(default)]
    pub transfer: Option<TransferComparison>,
    pub overall_status: OverallStatus,
}
