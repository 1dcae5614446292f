//! JanSahayak: Civic Complaint Intelligence
//!
//! Complaint-processing core for a citizen civic-issue portal.
//!
//! ## Architecture
//!
//! - **Risk Engine**: Pure deterministic scoring from damage assessments
//! - **Memory Index**: Recurring-issue detection over committed complaints
//! - **Complaint Store**: Persisted records with a lifecycle state machine
//! - **Orchestrator**: Drives intake through vision, risk, recurrence,
//!   planning, and commit

pub mod api;
pub mod background;
pub mod collaborators;
pub mod config;
pub mod memory;
pub mod pipeline;
pub mod risk;
pub mod store;
pub mod types;

// Re-export portal configuration
pub use config::PortalConfig;

// Re-export commonly used types
pub use types::{
    ActionPlan, CitizenContact, Complaint, ComplaintId, DamageAssessment, DamageType, GeoPoint,
    InvalidAssessment, Location, PlanState, RecurrenceSignal, RiskAssessment, RiskFactor, Status,
    StatusEntry, UrgencyTier,
};

// Re-export pipeline components
pub use pipeline::{IntakeSettings, OrchestrationError, Orchestrator, RawSubmission};

// Re-export storage
pub use memory::MemoryIndex;
pub use store::{ComplaintFilter, ComplaintStore, StoreError, StoreStats};

// Re-export collaborator seams
pub use collaborators::{
    CollaboratorError, NotificationSink, PlanningCollaborator, PlanningContext, RetryPolicy,
    VisionCollaborator,
};
