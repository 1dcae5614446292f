//! Sled-backed complaint store with per-record atomicity
//!
//! Key: complaint ID bytes. Value: JSON-serialized self-contained record.
//!
//! `create` and `transition` go through sled's compare-and-swap so the
//! state-machine precondition is re-validated against the persisted value at
//! commit time. Two authorities racing on the same record cannot lose an
//! update: the loser re-reads and re-validates, and if the winner's
//! transition invalidated its precondition it fails with `InvalidTransition`.
//!
//! Note: Does not call flush() on each write for performance. Sled provides
//! durability via background flushing; on crash at most the last few writes
//! may be lost, and the recurrence index is rebuilt from the records at the
//! next startup if it falls behind.

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::warn;

use super::lifecycle;
use super::{ComplaintEvent, ComplaintEventKind, StoreError};
use crate::memory::{MemoryIndex, RecurrenceEntry};
use crate::types::{ActionPlan, Complaint, ComplaintId, PlanState, Status, StatusEntry, UrgencyTier};

const TREE_NAME: &str = "complaints";

/// Attempts at minting a unique ID before giving up. With 50-bit tokens a
/// single retry is already overwhelmingly unlikely to be needed.
const MAX_ID_ATTEMPTS: usize = 4;

// ============================================================================
// Filter
// ============================================================================

/// Dashboard query filter; `None` fields match everything
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplaintFilter {
    pub status: Option<Status>,
    pub min_risk: Option<u8>,
    pub tier: Option<UrgencyTier>,
}

// ============================================================================
// Store
// ============================================================================

/// Authoritative complaint record set
#[derive(Clone)]
pub struct ComplaintStore {
    tree: sled::Tree,
    memory: MemoryIndex,
    events: mpsc::UnboundedSender<ComplaintEvent>,
}

impl ComplaintStore {
    /// Open or create the complaint tree inside the shared database.
    ///
    /// If the recurrence index is empty while complaints exist (partial
    /// restore, index tree lost), the index is rebuilt from the records.
    pub fn open(
        db: &sled::Db,
        memory: MemoryIndex,
        events: mpsc::UnboundedSender<ComplaintEvent>,
    ) -> Result<Self, StoreError> {
        let tree = db.open_tree(TREE_NAME)?;
        let store = Self {
            tree,
            memory,
            events,
        };
        if store.memory.is_empty() && !store.tree.is_empty() {
            let complaints = store.scan()?;
            store.memory.rebuild(complaints.iter())?;
        }
        Ok(store)
    }

    /// Persist a newly assembled complaint and return it with its final ID.
    ///
    /// Expects the complaint in the initial `Submitted` state as produced by
    /// `Complaint::assemble`. Insertion is compare-and-swap against an empty
    /// slot, so an existing record is never overwritten; on the rare token
    /// collision a fresh ID is minted. The recurrence index entry is appended
    /// only after the record write succeeds.
    pub fn create(&self, mut complaint: Complaint) -> Result<Complaint, StoreError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let bytes = serde_json::to_vec(&complaint)?;
            match self
                .tree
                .compare_and_swap(complaint.id.as_bytes(), None::<&[u8]>, Some(bytes))?
            {
                Ok(()) => {
                    self.memory.record(&RecurrenceEntry {
                        complaint_id: complaint.id.clone(),
                        damage_type: complaint.assessment.damage_type,
                        point: complaint.location.point,
                        created_at: complaint.created_at,
                    })?;
                    self.emit(&complaint, ComplaintEventKind::Created);
                    return Ok(complaint);
                }
                Err(_occupied) => {
                    complaint.id = ComplaintId::generate();
                }
            }
        }
        Err(StoreError::Database(
            "could not allocate a unique complaint ID".to_string(),
        ))
    }

    /// Fetch one complaint by ID.
    pub fn get(&self, id: &ComplaintId) -> Result<Complaint, StoreError> {
        let bytes = self
            .tree
            .get(id.as_bytes())?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Apply a lifecycle transition.
    ///
    /// The precondition is validated against the current persisted record
    /// and re-validated on every compare-and-swap retry, so a concurrent
    /// transition that already advanced the record turns this one into
    /// `InvalidTransition` instead of a lost update. Every accepted
    /// transition appends exactly one history entry.
    pub fn transition(
        &self,
        id: &ComplaintId,
        new_status: Status,
        actor: &str,
        note: Option<String>,
    ) -> Result<Complaint, StoreError> {
        loop {
            let current_bytes = self
                .tree
                .get(id.as_bytes())?
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            let mut complaint: Complaint = serde_json::from_slice(&current_bytes)?;

            let from = complaint.status;
            if !lifecycle::transition_allowed(from, new_status) {
                return Err(StoreError::InvalidTransition {
                    id: id.clone(),
                    from,
                    to: new_status,
                });
            }

            // History must stay monotonically time-ordered even if the wall
            // clock steps backwards between transitions.
            let now = Utc::now();
            let timestamp = complaint
                .history
                .last()
                .map_or(now, |last| last.timestamp.max(now));

            complaint.status = new_status;
            complaint.history.push(StatusEntry {
                status: new_status,
                timestamp,
                actor: actor.to_string(),
                note: note.clone(),
            });

            let new_bytes = serde_json::to_vec(&complaint)?;
            match self.tree.compare_and_swap(
                id.as_bytes(),
                Some(&current_bytes[..]),
                Some(new_bytes),
            )? {
                Ok(()) => {
                    self.emit(
                        &complaint,
                        ComplaintEventKind::StatusChanged {
                            from,
                            to: new_status,
                        },
                    );
                    return Ok(complaint);
                }
                // Concurrent writer got there first: re-read and re-validate.
                Err(_) => continue,
            }
        }
    }

    /// Attach a backfilled action plan to a `PlanPending` complaint.
    ///
    /// Idempotent: a complaint whose plan is already `Ready` is returned
    /// unchanged. Never touches status or history.
    pub fn attach_plan(&self, id: &ComplaintId, plan: ActionPlan) -> Result<Complaint, StoreError> {
        loop {
            let current_bytes = self
                .tree
                .get(id.as_bytes())?
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            let mut complaint: Complaint = serde_json::from_slice(&current_bytes)?;

            if complaint.plan_state == PlanState::Ready {
                return Ok(complaint);
            }

            complaint.plan = Some(plan.clone());
            complaint.plan_state = PlanState::Ready;

            let new_bytes = serde_json::to_vec(&complaint)?;
            match self.tree.compare_and_swap(
                id.as_bytes(),
                Some(&current_bytes[..]),
                Some(new_bytes),
            )? {
                Ok(()) => {
                    self.emit(&complaint, ComplaintEventKind::PlanAttached);
                    return Ok(complaint);
                }
                Err(_) => continue,
            }
        }
    }

    /// Dashboard queue query.
    ///
    /// Ordering: risk score descending, ties broken by created timestamp
    /// ascending so long-pending low-risk issues are not starved. The
    /// underlying scan iterates keys in a fixed order and the sort is
    /// stable, so repeated calls over unchanged data return the same
    /// sequence.
    pub fn query(&self, filter: &ComplaintFilter) -> Result<Vec<Complaint>, StoreError> {
        let mut results: Vec<Complaint> = self
            .scan()?
            .into_iter()
            .filter(|c| filter.status.map_or(true, |s| c.status == s))
            .filter(|c| filter.min_risk.map_or(true, |m| c.risk.score >= m))
            .filter(|c| filter.tier.map_or(true, |t| c.risk.tier == t))
            .collect();
        results.sort_by(|a, b| {
            b.risk
                .score
                .cmp(&a.risk.score)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(results)
    }

    /// Most recently created complaints, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Complaint>, StoreError> {
        let mut results = self.scan()?;
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results.truncate(limit);
        Ok(results)
    }

    /// Complaints still waiting for a plan, oldest first (backfill order).
    pub fn pending_plans(&self, limit: usize) -> Result<Vec<Complaint>, StoreError> {
        let mut results: Vec<Complaint> = self
            .scan()?
            .into_iter()
            .filter(|c| c.plan_state == PlanState::Pending)
            .collect();
        results.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        results.truncate(limit);
        Ok(results)
    }

    /// Total number of stored complaints.
    pub fn count(&self) -> usize {
        self.tree.len()
    }

    /// Deserialize every record, skipping unreadable ones with a warning.
    pub(super) fn scan(&self) -> Result<Vec<Complaint>, StoreError> {
        let mut out = Vec::new();
        for item in self.tree.iter() {
            let (_, value) = item?;
            match serde_json::from_slice::<Complaint>(&value) {
                Ok(complaint) => out.push(complaint),
                Err(e) => warn!(error = %e, "skipping unreadable complaint record"),
            }
        }
        Ok(out)
    }

    /// Fire-and-forget event emission. A closed channel means nobody is
    /// listening (tests, shutdown) and is not an error.
    fn emit(&self, complaint: &Complaint, kind: ComplaintEventKind) {
        let _ = self.events.send(ComplaintEvent {
            complaint_id: complaint.id.clone(),
            kind,
            status: complaint.status,
            tier: complaint.risk.tier,
            at: Utc::now(),
        });
    }
}
