pub mod comparison;
pub mod correction;
pub mod intent;
pub mod report;
pub mod schedule;
pub mod slot;

pub use comparison::{
    ChildComparison, ChildMatchStatus, IntentDeliveryComparison, OverallStatus,
    TransferComparison, TransferStatus,
};
pub use correction::{
    CorrectionAction, CorrectionProposal, CorrectionRecord, CorrectionResult, CorrectionStatus,
    ProposalState, RecordStatus,
};
pub use intent::{BookingIntent, TransferOutcome};
pub use report::BookingReportEntry;
pub use schedule::{CurrentBookingChild, ScheduledAppointment};
pub use slot::{GroupedSlots, SlotAlternative, SlotCheckResult};
