//! Complaint store — authoritative persisted record set
//!
//! Sled-backed storage for complaints with:
//! - lifecycle state machine enforcement (`lifecycle`)
//! - per-record atomicity via compare-and-swap (`complaints`)
//! - dashboard queries and aggregate stats (`stats`)
//!
//! Every accepted mutation emits a `ComplaintEvent` on a fire-and-forget
//! channel; the notification sink drains it asynchronously and can never
//! fail or roll back a commit.

pub mod lifecycle;

mod complaints;
mod stats;

pub use complaints::{ComplaintFilter, ComplaintStore};
pub use stats::StoreStats;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ComplaintId, Status, UrgencyTier};

// ============================================================================
// Errors
// ============================================================================

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("complaint {0} not found")]
    NotFound(ComplaintId),
    #[error("invalid transition {from} -> {to} for {id}")]
    InvalidTransition {
        id: ComplaintId,
        from: Status,
        to: Status,
    },
    #[error("database error: {0}")]
    Database(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

// ============================================================================
// Events
// ============================================================================

/// What happened to a complaint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum ComplaintEventKind {
    Created,
    StatusChanged { from: Status, to: Status },
    PlanAttached,
}

/// Notification payload emitted on creation and every accepted transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplaintEvent {
    pub complaint_id: ComplaintId,
    #[serde(flatten)]
    pub kind: ComplaintEventKind,
    /// Status after the event
    pub status: Status,
    pub tier: UrgencyTier,
    pub at: DateTime<Utc>,
}
