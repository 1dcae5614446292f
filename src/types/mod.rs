//! Shared data structures for the civic complaint processing pipeline
//!
//! This module defines the core types for the complaint intake pipeline:
//! - Intake: DamageAssessment (vision collaborator output, validated at the boundary)
//! - Scoring: RiskAssessment with audit breakdown
//! - Recurrence: RecurrenceSignal derived from the memory index
//! - Record: Complaint with lifecycle status, append-only history, intake trace

mod assessment;
mod complaint;
mod location;
mod risk;
mod recurrence;

pub use assessment::*;
pub use complaint::*;
pub use location::*;
pub use risk::*;
pub use recurrence::*;
