//! Orchestrator — one complaint through the full analysis pipeline
//!
//! Sequential stages, each consuming the prior stage's output:
//!
//! 1. Validate the raw submission (fail fast, `InvalidSubmission`)
//! 2. Vision collaborator -> DamageAssessment (`VisionUnavailable` /
//!    `InvalidAssessment`; the pipeline never fabricates an assessment)
//! 3. Risk engine (pure, cannot fail on validated input)
//! 4. Recurrence lookup against committed complaints only
//! 5. Planning collaborator -> ActionPlan; on failure the complaint is
//!    committed without a plan, flagged `PlanPending`, so the risk and
//!    recurrence work already done is not discarded
//! 6. Store commit; nothing before this point is ever persisted
//!
//! Collaborator calls are the only suspension points and run without any
//! lock on shared state; concurrent intakes never block each other.
//! Cancellation anywhere before the commit discards all partial work.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::collaborators::{
    call_with_retry, CollaboratorError, PlanningCollaborator, PlanningContext, RetryPolicy,
    VisionCollaborator,
};
use crate::memory::{MemoryIndex, DEFAULT_RADIUS_M};
use crate::risk;
use crate::store::{ComplaintStore, StoreError};
use crate::types::{
    CitizenContact, Complaint, ComplaintId, IntakeStage, Location, PlanState, TraceEvent,
};

use super::RawSubmission;

// ============================================================================
// Errors
// ============================================================================

/// Pipeline failure taxonomy. Everything here means "no complaint was
/// created"; the degraded planning path is a success with `PlanPending`.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// Client error, rejected before any collaborator call
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
    /// Vision collaborator failed; citizen must retry
    #[error("vision collaborator unavailable: {0}")]
    VisionUnavailable(CollaboratorError),
    /// Collaborator responded but the output failed validation
    #[error("invalid assessment: {0}")]
    InvalidAssessment(String),
    /// Intake abandoned mid-pipeline; no partial work persisted
    #[error("intake cancelled")]
    Cancelled,
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// Settings
// ============================================================================

/// Tunables the orchestrator needs from configuration
#[derive(Debug, Clone)]
pub struct IntakeSettings {
    /// Retry budget for each collaborator stage
    pub retry: RetryPolicy,
    /// Recurrence match radius in metres
    pub recurrence_radius_m: f64,
    /// Recurrence lookback window; `None` means unlimited
    pub recurrence_lookback: Option<chrono::Duration>,
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            recurrence_radius_m: DEFAULT_RADIUS_M,
            recurrence_lookback: None,
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives intake submissions through the pipeline into the store
pub struct Orchestrator {
    vision: Arc<dyn VisionCollaborator>,
    planner: Arc<dyn PlanningCollaborator>,
    store: Arc<ComplaintStore>,
    memory: MemoryIndex,
    settings: IntakeSettings,
    /// Total intakes that reached a commit
    intakes_committed: AtomicU64,
}

impl Orchestrator {
    pub fn new(
        vision: Arc<dyn VisionCollaborator>,
        planner: Arc<dyn PlanningCollaborator>,
        store: Arc<ComplaintStore>,
        memory: MemoryIndex,
        settings: IntakeSettings,
    ) -> Self {
        Self {
            vision,
            planner,
            store,
            memory,
            settings,
            intakes_committed: AtomicU64::new(0),
        }
    }

    /// Process one citizen submission end to end.
    ///
    /// Runs independently of any other intake. The cancellation token covers
    /// the whole pipeline: once cancelled, partial work is discarded and
    /// nothing is persisted.
    pub async fn process_intake(
        &self,
        submission: RawSubmission,
        cancel: CancellationToken,
    ) -> Result<Complaint, OrchestrationError> {
        let mut trace = Vec::new();

        // Stage 1: validation, before any collaborator call
        submission
            .validate()
            .map_err(OrchestrationError::InvalidSubmission)?;
        trace.push(TraceEvent::new(
            IntakeStage::Validate,
            format!("'{}' at {}", submission.issue_type, submission.address),
        ));

        // Stage 2: vision analysis
        let assessment = tokio::select! {
            _ = cancel.cancelled() => return Err(OrchestrationError::Cancelled),
            result = call_with_retry("vision", &self.settings.retry, || {
                self.vision.analyze(&submission.photo, &submission.issue_type)
            }) => result.map_err(|e| match e {
                CollaboratorError::Malformed(reason) => {
                    OrchestrationError::InvalidAssessment(reason)
                }
                unavailable => OrchestrationError::VisionUnavailable(unavailable),
            })?,
        };
        // Re-validate at the boundary: a trait impl that skipped
        // `DamageAssessment::new` still cannot push a bad severity through.
        assessment
            .validate()
            .map_err(|e| OrchestrationError::InvalidAssessment(e.to_string()))?;
        trace.push(TraceEvent::new(
            IntakeStage::Vision,
            format!(
                "detected {} severity {}",
                assessment.damage_type, assessment.severity
            ),
        ));

        // Stage 3: deterministic risk scoring
        let risk = risk::compute_risk(&assessment, &submission.context_flags)
            .map_err(|e| OrchestrationError::InvalidAssessment(e.to_string()))?;
        trace.push(TraceEvent::new(
            IntakeStage::Risk,
            format!("score {} tier {}", risk.score, risk.tier),
        ));

        // Stage 4: recurrence against committed complaints only
        let recurrence = self.memory.find_recurrence(
            submission.point(),
            assessment.damage_type,
            self.settings.recurrence_radius_m,
            self.settings.recurrence_lookback,
        );
        trace.push(TraceEvent::new(
            IntakeStage::Recurrence,
            format!("{} prior match(es)", recurrence.match_count),
        ));

        if cancel.is_cancelled() {
            return Err(OrchestrationError::Cancelled);
        }

        // Stage 5: planning, degrading to PlanPending on failure
        let location = Location {
            point: submission.point(),
            address: submission.address.clone(),
        };
        let context = PlanningContext {
            assessment: assessment.clone(),
            risk: risk.clone(),
            recurrence: recurrence.clone(),
            location: location.clone(),
        };
        let plan_result = tokio::select! {
            _ = cancel.cancelled() => return Err(OrchestrationError::Cancelled),
            result = call_with_retry("planning", &self.settings.retry, || {
                self.planner.plan(&context)
            }) => result,
        };
        let (plan, plan_state) = match plan_result {
            Ok(plan) => {
                trace.push(TraceEvent::new(
                    IntakeStage::Planning,
                    format!("{} immediate action(s)", plan.immediate_actions.len()),
                ));
                (Some(plan), PlanState::Ready)
            }
            Err(e) => {
                warn!(error = %e, "planning collaborator failed; committing with plan pending");
                trace.push(TraceEvent::new(
                    IntakeStage::Planning,
                    "degraded: plan pending backfill".to_string(),
                ));
                (None, PlanState::Pending)
            }
        };

        if cancel.is_cancelled() {
            return Err(OrchestrationError::Cancelled);
        }

        // Stage 6: commit
        trace.push(TraceEvent::new(IntakeStage::Commit, "persisting complaint"));
        let complaint = Complaint::assemble(
            ComplaintId::generate(),
            CitizenContact {
                name: submission.citizen_name,
                phone: submission.citizen_phone,
            },
            location,
            assessment,
            risk,
            recurrence,
            plan,
            plan_state,
            trace,
        );
        let complaint = self.store.create(complaint)?;
        self.intakes_committed.fetch_add(1, Ordering::Relaxed);

        info!(
            complaint = %complaint.id,
            score = complaint.risk.score,
            tier = %complaint.risk.tier,
            recurring = complaint.recurrence.recurring,
            plan = %complaint.plan_state,
            "complaint registered"
        );

        Ok(complaint)
    }

    /// Number of intakes that reached a successful commit.
    pub fn committed(&self) -> u64 {
        self.intakes_committed.load(Ordering::Relaxed)
    }
}
