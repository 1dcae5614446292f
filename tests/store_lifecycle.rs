//! Complaint Store Lifecycle Tests
//!
//! Exercises the persisted record set: creation, round-trip fidelity, the
//! lifecycle state machine under sequential and concurrent transitions,
//! queue ordering, and aggregate stats. Uses a tempfile-backed sled
//! database per test.

use chrono::{Duration, Utc};
use jansahayak::memory::MemoryIndex;
use jansahayak::store::{ComplaintEvent, ComplaintEventKind, ComplaintFilter, ComplaintStore, StoreError};
use jansahayak::types::{
    ActionPlan, CitizenContact, Complaint, ComplaintId, DamageAssessment, DamageType, GeoPoint,
    Location, PlanState, RecurrenceSignal, RiskAssessment, Status, UrgencyTier,
};
use tokio::sync::mpsc::UnboundedReceiver;

// ============================================================================
// Helpers
// ============================================================================

struct Rig {
    store: ComplaintStore,
    events: UnboundedReceiver<ComplaintEvent>,
    dir: tempfile::TempDir,
}

fn open_rig() -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let db = sled::open(dir.path().join("db")).unwrap();
    let memory = MemoryIndex::open(&db).unwrap();
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let store = ComplaintStore::open(&db, memory, tx).unwrap();
    Rig {
        store,
        events: rx,
        dir,
    }
}

fn sample_complaint(score: u8) -> Complaint {
    let assessment =
        DamageAssessment::new(DamageType::Pothole, 5, Default::default(), "deep pothole").unwrap();
    Complaint::assemble(
        ComplaintId::generate(),
        CitizenContact {
            name: "Asha".to_string(),
            phone: "9800000000".to_string(),
        },
        Location {
            point: GeoPoint::new(12.9716, 77.5946),
            address: "MG Road, ward 12".to_string(),
        },
        assessment,
        RiskAssessment {
            score,
            tier: UrgencyTier::from_score(score),
            breakdown: Vec::new(),
        },
        RecurrenceSignal::none(),
        Some(ActionPlan {
            immediate_actions: vec!["cordon area".to_string(), "fill with cold mix".to_string()],
            required_resources: vec!["barricades".to_string()],
            timeline: "48 hours".to_string(),
            budget_min_inr: 5_000,
            budget_max_inr: 20_000,
        }),
        PlanState::Ready,
        Vec::new(),
    )
}

// ============================================================================
// Creation & round-trip
// ============================================================================

#[test]
fn test_create_then_get_round_trip() {
    let rig = open_rig();
    let created = rig.store.create(sample_complaint(42)).unwrap();
    let loaded = rig.store.get(&created.id).unwrap();
    assert_eq!(created, loaded);
}

#[test]
fn test_round_trip_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let created;
    {
        let db = sled::open(dir.path().join("db")).unwrap();
        let memory = MemoryIndex::open(&db).unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let store = ComplaintStore::open(&db, memory, tx).unwrap();
        let mut complaint = rig_complaint_with_history();
        complaint = store.create(complaint).unwrap();
        complaint = store
            .transition(&complaint.id, Status::UnderReview, "officer-7", Some("triaged".to_string()))
            .unwrap();
        created = complaint;
        db.flush().unwrap();
    }

    // Fresh handles over the same files
    let db = sled::open(dir.path().join("db")).unwrap();
    let memory = MemoryIndex::open(&db).unwrap();
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let store = ComplaintStore::open(&db, memory, tx).unwrap();
    let loaded = store.get(&created.id).unwrap();

    assert_eq!(created, loaded);
    assert_eq!(loaded.history.len(), 2);
    assert_eq!(loaded.history[0].status, Status::Submitted);
    assert_eq!(loaded.history[1].status, Status::UnderReview);
    assert_eq!(loaded.history[1].actor, "officer-7");
}

fn rig_complaint_with_history() -> Complaint {
    sample_complaint(77)
}

#[test]
fn test_new_complaint_starts_submitted_with_one_history_entry() {
    let rig = open_rig();
    let complaint = rig.store.create(sample_complaint(30)).unwrap();
    assert_eq!(complaint.status, Status::Submitted);
    assert_eq!(complaint.history.len(), 1);
    assert_eq!(complaint.history[0].status, Status::Submitted);
    assert_eq!(complaint.history[0].actor, "citizen");
}

#[test]
fn test_id_collision_mints_fresh_id_never_overwrites() {
    let rig = open_rig();
    let first = rig.store.create(sample_complaint(10)).unwrap();

    let mut second = sample_complaint(90);
    second.id = first.id.clone();
    let second = rig.store.create(second).unwrap();

    assert_ne!(first.id, second.id, "occupied ID must not be reused");
    assert_eq!(rig.store.count(), 2);
    // the original record is untouched
    assert_eq!(rig.store.get(&first.id).unwrap().risk.score, 10);
}

#[test]
fn test_get_unknown_id_is_not_found() {
    let rig = open_rig();
    let missing = ComplaintId::from("JAN-0000000000");
    match rig.store.get(&missing) {
        Err(StoreError::NotFound(id)) => assert_eq!(id, missing),
        other => panic!("expected NotFound, got {:?}", other.map(|c| c.id)),
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_full_happy_path_to_resolved() {
    let rig = open_rig();
    let complaint = rig.store.create(sample_complaint(60)).unwrap();
    let id = complaint.id;

    rig.store.transition(&id, Status::UnderReview, "officer-1", None).unwrap();
    rig.store.transition(&id, Status::InProgress, "crew-4", None).unwrap();
    let done = rig
        .store
        .transition(&id, Status::Resolved, "crew-4", Some("patched".to_string()))
        .unwrap();

    assert_eq!(done.status, Status::Resolved);
    let statuses: Vec<Status> = done.history.iter().map(|h| h.status).collect();
    assert_eq!(
        statuses,
        vec![Status::Submitted, Status::UnderReview, Status::InProgress, Status::Resolved]
    );
    // history is monotonically time-ordered
    for pair in done.history.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}

#[test]
fn test_invalid_transition_leaves_state_unchanged() {
    let rig = open_rig();
    let complaint = rig.store.create(sample_complaint(60)).unwrap();

    let result = rig.store.transition(&complaint.id, Status::Resolved, "officer-1", None);
    match result {
        Err(StoreError::InvalidTransition { from, to, .. }) => {
            assert_eq!(from, Status::Submitted);
            assert_eq!(to, Status::Resolved);
        }
        other => panic!("expected InvalidTransition, got {:?}", other.map(|c| c.status)),
    }

    let stored = rig.store.get(&complaint.id).unwrap();
    assert_eq!(stored.status, Status::Submitted);
    assert_eq!(stored.history.len(), 1);
}

#[test]
fn test_terminal_states_accept_no_transitions() {
    let rig = open_rig();
    let complaint = rig.store.create(sample_complaint(60)).unwrap();
    let id = complaint.id;
    rig.store.transition(&id, Status::UnderReview, "a", None).unwrap();
    rig.store.transition(&id, Status::InProgress, "a", None).unwrap();
    rig.store.transition(&id, Status::Resolved, "a", None).unwrap();

    for target in [
        Status::Submitted,
        Status::UnderReview,
        Status::InProgress,
        Status::Rejected,
    ] {
        assert!(
            matches!(
                rig.store.transition(&id, target, "a", None),
                Err(StoreError::InvalidTransition { .. })
            ),
            "Resolved accepted a transition to {target}"
        );
    }
}

#[test]
fn test_authority_may_reject_from_review() {
    let rig = open_rig();
    let complaint = rig.store.create(sample_complaint(20)).unwrap();
    rig.store.transition(&complaint.id, Status::UnderReview, "officer-2", None).unwrap();
    let rejected = rig
        .store
        .transition(&complaint.id, Status::Rejected, "officer-2", Some("duplicate".to_string()))
        .unwrap();
    assert_eq!(rejected.status, Status::Rejected);
    assert_eq!(rejected.history.last().unwrap().note.as_deref(), Some("duplicate"));
}

#[test]
fn test_concurrent_transitions_exactly_one_wins() {
    let rig = open_rig();
    let complaint = rig.store.create(sample_complaint(60)).unwrap();
    let id = complaint.id;
    rig.store.transition(&id, Status::UnderReview, "officer-1", None).unwrap();

    // Two authorities race the same UnderReview -> InProgress edge. The
    // commit-time re-validation must fail exactly one of them.
    let mut handles = Vec::new();
    for actor in ["officer-a", "officer-b"] {
        let store = rig.store.clone();
        let id = id.clone();
        handles.push(std::thread::spawn(move || {
            store.transition(&id, Status::InProgress, actor, None)
        }));
    }

    let results: Vec<Result<Complaint, StoreError>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::InvalidTransition { .. })))
        .count();
    assert_eq!(wins, 1, "exactly one racer must win");
    assert_eq!(conflicts, 1, "the loser must see InvalidTransition");

    // No lost update: exactly one InProgress entry was appended.
    let stored = rig.store.get(&id).unwrap();
    assert_eq!(stored.status, Status::InProgress);
    assert_eq!(stored.history.len(), 3);
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_query_orders_by_risk_desc_then_created_asc() {
    let rig = open_rig();

    let mut low_old = sample_complaint(40);
    low_old.created_at = Utc::now() - Duration::hours(3);
    let mut low_new = sample_complaint(40);
    low_new.created_at = Utc::now() - Duration::hours(1);
    let high = sample_complaint(90);

    let low_old = rig.store.create(low_old).unwrap();
    let high = rig.store.create(high).unwrap();
    let low_new = rig.store.create(low_new).unwrap();

    let results = rig.store.query(&ComplaintFilter::default()).unwrap();
    let ids: Vec<&ComplaintId> = results.iter().map(|c| &c.id).collect();
    // highest risk first; equal risk resolves oldest-first so long-pending
    // low-risk complaints are not starved
    assert_eq!(ids, vec![&high.id, &low_old.id, &low_new.id]);

    // stable under repeated calls with no data changes
    for _ in 0..3 {
        let again = rig.store.query(&ComplaintFilter::default()).unwrap();
        assert_eq!(results, again);
    }
}

#[test]
fn test_query_filters() {
    let rig = open_rig();
    let low = rig.store.create(sample_complaint(10)).unwrap();
    let high = rig.store.create(sample_complaint(60)).unwrap();
    let critical = rig.store.create(sample_complaint(80)).unwrap();
    rig.store.transition(&high.id, Status::UnderReview, "o", None).unwrap();

    let by_status = rig
        .store
        .query(&ComplaintFilter {
            status: Some(Status::UnderReview),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_status.len(), 1);
    assert_eq!(by_status[0].id, high.id);

    let by_min_risk = rig
        .store
        .query(&ComplaintFilter {
            min_risk: Some(50),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_min_risk.len(), 2);
    assert!(by_min_risk.iter().all(|c| c.risk.score >= 50));

    let by_tier = rig
        .store
        .query(&ComplaintFilter {
            tier: Some(UrgencyTier::Critical),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_tier.len(), 1);
    assert_eq!(by_tier[0].id, critical.id);

    let _ = low;
}

#[test]
fn test_recent_returns_newest_first() {
    let rig = open_rig();
    let mut older = sample_complaint(50);
    older.created_at = Utc::now() - Duration::hours(2);
    let older = rig.store.create(older).unwrap();
    let newer = rig.store.create(sample_complaint(10)).unwrap();

    let recent = rig.store.recent(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, newer.id);
    assert_eq!(recent[1].id, older.id);

    assert_eq!(rig.store.recent(1).unwrap().len(), 1);
}

// ============================================================================
// Plans
// ============================================================================

fn pending_complaint(score: u8) -> Complaint {
    let mut complaint = sample_complaint(score);
    complaint.plan = None;
    complaint.plan_state = PlanState::Pending;
    complaint
}

fn backfilled_plan() -> ActionPlan {
    ActionPlan {
        immediate_actions: vec!["inspect".to_string()],
        required_resources: vec![],
        timeline: "1 week".to_string(),
        budget_min_inr: 1_000,
        budget_max_inr: 2_000,
    }
}

#[test]
fn test_pending_plans_listing() {
    let rig = open_rig();
    let mut old_pending = pending_complaint(30);
    old_pending.created_at = Utc::now() - Duration::hours(5);
    let old_pending = rig.store.create(old_pending).unwrap();
    let new_pending = rig.store.create(pending_complaint(30)).unwrap();
    rig.store.create(sample_complaint(30)).unwrap();

    let pending = rig.store.pending_plans(10).unwrap();
    let ids: Vec<&ComplaintId> = pending.iter().map(|c| &c.id).collect();
    assert_eq!(ids, vec![&old_pending.id, &new_pending.id]);
}

#[test]
fn test_attach_plan_is_idempotent_and_leaves_history_alone() {
    let rig = open_rig();
    let complaint = rig.store.create(pending_complaint(30)).unwrap();

    let attached = rig.store.attach_plan(&complaint.id, backfilled_plan()).unwrap();
    assert_eq!(attached.plan_state, PlanState::Ready);
    assert_eq!(attached.plan.as_ref().unwrap().timeline, "1 week");
    assert_eq!(attached.history.len(), 1, "attach must not write history");

    // Second attach with a different plan is a no-op
    let mut other = backfilled_plan();
    other.timeline = "overwritten".to_string();
    let again = rig.store.attach_plan(&complaint.id, other).unwrap();
    assert_eq!(again.plan.as_ref().unwrap().timeline, "1 week");
}

// ============================================================================
// Stats & events
// ============================================================================

#[test]
fn test_stats_aggregates() {
    let rig = open_rig();
    let a = rig.store.create(sample_complaint(80)).unwrap();
    rig.store.create(sample_complaint(10)).unwrap();
    rig.store.create(pending_complaint(60)).unwrap();

    rig.store.transition(&a.id, Status::UnderReview, "o", None).unwrap();
    rig.store.transition(&a.id, Status::InProgress, "o", None).unwrap();
    rig.store.transition(&a.id, Status::Resolved, "o", None).unwrap();

    let stats = rig.store.stats().unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_status.get("Resolved"), Some(&1));
    assert_eq!(stats.by_status.get("Submitted"), Some(&2));
    assert_eq!(stats.by_tier.get("CRITICAL"), Some(&1));
    assert_eq!(stats.by_damage_type.get("pothole"), Some(&3));
    assert_eq!(stats.plan_pending, 1);
    assert!((stats.resolution_rate - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_events_emitted_for_create_and_transition() {
    let mut rig = open_rig();
    let complaint = rig.store.create(sample_complaint(50)).unwrap();
    rig.store.transition(&complaint.id, Status::UnderReview, "officer-1", None).unwrap();

    let first = rig.events.try_recv().unwrap();
    assert_eq!(first.kind, ComplaintEventKind::Created);
    assert_eq!(first.complaint_id, complaint.id);

    let second = rig.events.try_recv().unwrap();
    assert_eq!(
        second.kind,
        ComplaintEventKind::StatusChanged {
            from: Status::Submitted,
            to: Status::UnderReview
        }
    );
}

#[test]
fn test_store_ops_survive_closed_event_channel() {
    let rig = open_rig();
    drop(rig.events);
    // Notification delivery failure must never fail the operation
    let complaint = rig.store.create(sample_complaint(50)).unwrap();
    rig.store.transition(&complaint.id, Status::UnderReview, "o", None).unwrap();
    let _ = &rig.dir;
}
