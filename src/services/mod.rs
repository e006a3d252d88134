pub mod classifier;
pub mod comparator;
pub mod orchestrator;
pub mod scheduling;
pub mod slots;
