//! Gateway services.

pub mod audit;
pub mod forwarder;
pub mod idempotency;
pub mod submission;

pub use audit::AuditLog;
pub use forwarder::{ClinicalForwarder, ForwardError};
pub use idempotency::IdempotencyCache;
pub use submission::{handle_submission, SubmissionOutcome};
