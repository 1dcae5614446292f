//! Plan backfill — periodic retry loop for PlanPending complaints
//!
//! A complaint committed during a planning-collaborator outage carries all
//! its risk and recurrence analysis but no plan. This loop sweeps the store
//! on an interval, rebuilds the planning context from the stored record, and
//! attaches the plan once the collaborator recovers. Attaching never touches
//! status or history, and a complaint that gained a plan some other way is
//! skipped (attach is idempotent).

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::collaborators::{call_with_retry, PlanningCollaborator, PlanningContext, RetryPolicy};
use crate::store::ComplaintStore;

/// Complaints picked up per sweep; the rest wait for the next interval.
const BACKFILL_BATCH: usize = 25;

/// Run the backfill loop until the token is cancelled.
pub async fn run_plan_backfill(
    store: Arc<ComplaintStore>,
    planner: Arc<dyn PlanningCollaborator>,
    retry: RetryPolicy,
    interval: Duration,
    cancel: CancellationToken,
) {
    info!(interval_secs = interval.as_secs(), "plan backfill loop starting");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("plan backfill loop stopping");
                return;
            }
            _ = sleep(interval) => {}
        }

        let pending = match store.pending_plans(BACKFILL_BATCH) {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e, "backfill sweep could not read pending complaints");
                continue;
            }
        };

        if pending.is_empty() {
            debug!("backfill sweep: nothing pending");
            continue;
        }

        let mut attached = 0usize;
        for complaint in &pending {
            if cancel.is_cancelled() {
                return;
            }

            let context = PlanningContext {
                assessment: complaint.assessment.clone(),
                risk: complaint.risk.clone(),
                recurrence: complaint.recurrence.clone(),
                location: complaint.location.clone(),
            };

            match call_with_retry("planning-backfill", &retry, || planner.plan(&context)).await {
                Ok(plan) => match store.attach_plan(&complaint.id, plan) {
                    Ok(_) => attached += 1,
                    Err(e) => warn!(complaint = %complaint.id, error = %e, "could not attach backfilled plan"),
                },
                Err(e) => {
                    // Collaborator still down; stop the sweep rather than
                    // hammering it once per pending complaint.
                    debug!(complaint = %complaint.id, error = %e, "planning still unavailable");
                    break;
                }
            }
        }

        if attached > 0 {
            info!(attached, pending = pending.len(), "backfill sweep attached plans");
        }
    }
}
