// Prediction pipeline tasks
pub mod parse_claim;
pub mod classify_claim;
pub mod record_claim;

// Shared modules
pub mod types;

// Re-export task implementations
pub use parse_claim::ParseClaimTask;
pub use classify_claim::ClassifyClaimTask;
pub use record_claim::RecordClaimTask;

// Re-export context keys
pub use types::session_keys;
