//! Complaint-processing orchestration pipeline
//!
//! Drives one complaint through the fixed stage sequence:
//! validate -> vision analysis -> risk scoring -> recurrence lookup ->
//! planning -> store commit. Stages pass immutable value objects; the only
//! nondeterminism lives behind the two external collaborator calls.

mod intake;
mod orchestrator;

pub use intake::RawSubmission;
pub use orchestrator::{IntakeSettings, OrchestrationError, Orchestrator};
