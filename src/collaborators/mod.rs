//! External collaborator seams: vision, planning, notification
//!
//! The core never implements image analysis or plan generation; it calls
//! these narrow async interfaces and treats the services behind them as
//! opaque and potentially nondeterministic. HTTP implementations live in
//! `http`; bounded retry with backoff in `retry`.

pub mod http;

mod retry;

pub use http::{HttpPlanningCollaborator, HttpVisionCollaborator, WebhookNotificationSink};
pub use retry::{call_with_retry, RetryPolicy};

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::store::ComplaintEvent;
use crate::types::{ActionPlan, DamageAssessment, Location, RecurrenceSignal, RiskAssessment};

// ============================================================================
// Errors
// ============================================================================

/// Error type for collaborator calls.
///
/// `Malformed` is a response that arrived but failed boundary validation;
/// the pipeline maps it to `InvalidAssessment` for vision. `Timeout` and
/// `Transport` map to the collaborator-unavailable failures.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

// ============================================================================
// Planning context
// ============================================================================

/// Everything the planning collaborator gets to work with
#[derive(Debug, Clone, Serialize)]
pub struct PlanningContext {
    pub assessment: DamageAssessment,
    pub risk: RiskAssessment,
    pub recurrence: RecurrenceSignal,
    pub location: Location,
}

// ============================================================================
// Traits
// ============================================================================

/// Vision collaborator: raw image in, structured damage assessment out.
///
/// Output is validated at this boundary; the pipeline never fabricates an
/// assessment when the collaborator fails.
#[async_trait]
pub trait VisionCollaborator: Send + Sync {
    async fn analyze(
        &self,
        photo: &[u8],
        issue_type: &str,
    ) -> Result<DamageAssessment, CollaboratorError>;
}

/// Planning collaborator: planning context in, remediation plan out.
#[async_trait]
pub trait PlanningCollaborator: Send + Sync {
    async fn plan(&self, context: &PlanningContext) -> Result<ActionPlan, CollaboratorError>;
}

/// Notification hook fired on creation and every status transition.
///
/// Fire-and-forget: delivery failure must never fail or roll back the store
/// operation that triggered it.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: &ComplaintEvent) -> Result<(), CollaboratorError>;
}

// ============================================================================
// Notifier task
// ============================================================================

/// Sink that only logs, for deployments without an SMS/webhook gateway.
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, event: &ComplaintEvent) -> Result<(), CollaboratorError> {
        debug!(
            complaint = %event.complaint_id,
            status = %event.status,
            tier = %event.tier,
            "complaint event"
        );
        Ok(())
    }
}

/// Drain the store's event channel into the sink.
///
/// Runs until the channel closes (store dropped at shutdown). Failures are
/// logged and dropped; the store never learns about them.
pub fn spawn_notifier(
    mut rx: mpsc::UnboundedReceiver<ComplaintEvent>,
    sink: Arc<dyn NotificationSink>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(e) = sink.notify(&event).await {
                warn!(
                    complaint = %event.complaint_id,
                    error = %e,
                    "notification delivery failed"
                );
            }
        }
        debug!("notifier channel closed");
    })
}
