//! Complaint record types: ComplaintId, lifecycle Status, history entries,
//! action plan, intake trace, and the Complaint itself
//!
//! A `Complaint` is constructed exactly once by the orchestrator and then
//! owned by the store. Status only moves through the lifecycle state machine
//! (see `store::lifecycle`), and the history log is append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DamageAssessment, Location, RecurrenceSignal, RiskAssessment};

// ============================================================================
// Complaint ID
// ============================================================================

const ID_PREFIX: &str = "JAN";
/// Crockford base32: no I, L, O, U to keep tokens unambiguous when read aloud.
const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const ID_TOKEN_LEN: usize = 10;

/// Short, collision-resistant, human-shareable complaint token.
///
/// Format: `JAN-` + 10 random base32 characters (50 bits). Generated before
/// persistence and independent of record content. The store never reuses or
/// overwrites an ID (insert is compare-and-swap against an empty slot).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ComplaintId(String);

impl ComplaintId {
    /// Generate a fresh random ID.
    pub fn generate() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let token: String = (0..ID_TOKEN_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        Self(format!("{}-{}", ID_PREFIX, token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key bytes for the sled tree.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<String> for ComplaintId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for ComplaintId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl std::fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Lifecycle status
// ============================================================================

/// Complaint lifecycle state.
///
/// Transitions are validated by `store::lifecycle::transition_allowed`;
/// `Resolved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    #[default]
    Submitted,
    UnderReview,
    InProgress,
    Resolved,
    Rejected,
}

impl Status {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Resolved | Status::Rejected)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Submitted => write!(f, "Submitted"),
            Status::UnderReview => write!(f, "UnderReview"),
            Status::InProgress => write!(f, "InProgress"),
            Status::Resolved => write!(f, "Resolved"),
            Status::Rejected => write!(f, "Rejected"),
        }
    }
}

/// One immutable line of the status audit trail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusEntry {
    pub status: Status,
    pub timestamp: DateTime<Utc>,
    /// Who caused the transition ("citizen" on creation, authority ID after)
    pub actor: String,
    pub note: Option<String>,
}

// ============================================================================
// Citizen contact & action plan
// ============================================================================

/// Contact details captured on the intake form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CitizenContact {
    pub name: String,
    pub phone: String,
}

/// Remediation plan from the planning collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionPlan {
    /// Ordered list of immediate actions
    pub immediate_actions: Vec<String>,
    pub required_resources: Vec<String>,
    pub timeline: String,
    /// Budget estimate range in INR
    pub budget_min_inr: u64,
    pub budget_max_inr: u64,
}

/// Whether the complaint carries a plan yet.
///
/// `Pending` is the degraded-success flag: the planning collaborator was
/// unavailable at intake and the backfill loop will retry later.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PlanState {
    Ready,
    Pending,
}

impl std::fmt::Display for PlanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanState::Ready => write!(f, "Ready"),
            PlanState::Pending => write!(f, "Pending"),
        }
    }
}

// ============================================================================
// Intake trace
// ============================================================================

/// Pipeline stage names for the intake trace
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IntakeStage {
    Validate,
    Vision,
    Risk,
    Recurrence,
    Planning,
    Commit,
}

impl std::fmt::Display for IntakeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeStage::Validate => write!(f, "validate"),
            IntakeStage::Vision => write!(f, "vision"),
            IntakeStage::Risk => write!(f, "risk"),
            IntakeStage::Recurrence => write!(f, "recurrence"),
            IntakeStage::Planning => write!(f, "planning"),
            IntakeStage::Commit => write!(f, "commit"),
        }
    }
}

/// One provenance line recorded as the pipeline advances
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceEvent {
    pub stage: IntakeStage,
    pub timestamp: DateTime<Utc>,
    pub detail: String,
}

impl TraceEvent {
    pub fn new(stage: IntakeStage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            timestamp: Utc::now(),
            detail: detail.into(),
        }
    }
}

// ============================================================================
// Complaint
// ============================================================================

/// A registered, trackable citizen complaint with full analysis provenance.
///
/// Owned exclusively by the `ComplaintStore` after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Complaint {
    pub id: ComplaintId,
    pub citizen: CitizenContact,
    pub location: Location,
    pub assessment: DamageAssessment,
    pub risk: RiskAssessment,
    pub recurrence: RecurrenceSignal,
    /// None while `plan_state` is `Pending`
    pub plan: Option<ActionPlan>,
    pub plan_state: PlanState,
    pub status: Status,
    /// Append-only, monotonically time-ordered status log
    pub history: Vec<StatusEntry>,
    /// Stage-by-stage intake provenance
    pub intake_trace: Vec<TraceEvent>,
    pub created_at: DateTime<Utc>,
}

impl Complaint {
    /// Assemble a new complaint in the initial `Submitted` state with its
    /// first history entry. Called exactly once per intake, by the
    /// orchestrator, just before the store commit.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        id: ComplaintId,
        citizen: CitizenContact,
        location: Location,
        assessment: DamageAssessment,
        risk: RiskAssessment,
        recurrence: RecurrenceSignal,
        plan: Option<ActionPlan>,
        plan_state: PlanState,
        intake_trace: Vec<TraceEvent>,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id,
            citizen,
            location,
            assessment,
            risk,
            recurrence,
            plan,
            plan_state,
            status: Status::Submitted,
            history: vec![StatusEntry {
                status: Status::Submitted,
                timestamp: created_at,
                actor: "citizen".to_string(),
                note: None,
            }],
            intake_trace,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        let id = ComplaintId::generate();
        let s = id.as_str();
        assert!(s.starts_with("JAN-"));
        assert_eq!(s.len(), 4 + 10);
        assert!(s[4..].bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_ids_are_distinct() {
        // 50 random bits: any collision here means the generator is broken
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(ComplaintId::generate()));
        }
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let id = ComplaintId::from("JAN-0123456789");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"JAN-0123456789\"");
    }

    #[test]
    fn test_terminal_states() {
        assert!(Status::Resolved.is_terminal());
        assert!(Status::Rejected.is_terminal());
        assert!(!Status::Submitted.is_terminal());
        assert!(!Status::UnderReview.is_terminal());
        assert!(!Status::InProgress.is_terminal());
    }
}
