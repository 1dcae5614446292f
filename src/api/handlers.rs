//! API route handlers
//!
//! Request handling for the citizen and authority endpoints:
//! - Intake (multipart photo + metadata) through the orchestrator
//! - Citizen tracking by complaint ID
//! - Authority lifecycle transitions
//! - Dashboard queue query, recent list, aggregate stats

use axum::extract::{Multipart, Path, Query, State};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::error;

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::pipeline::{Orchestrator, RawSubmission};
use crate::store::ComplaintStore;
use crate::store::ComplaintFilter;
use crate::types::{ComplaintId, RiskFactor, Status, UrgencyTier};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<ComplaintStore>,
    /// Cancelled at shutdown; aborts in-flight intakes before their commit
    pub cancel: CancellationToken,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(orchestrator: Arc<Orchestrator>, store: Arc<ComplaintStore>) -> Self {
        Self {
            orchestrator,
            store,
            cancel: CancellationToken::new(),
            started_at: Instant::now(),
        }
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub complaints_total: usize,
    pub intakes_committed: u64,
}

pub async fn health_check(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(HealthResponse {
        status: "ok",
        uptime_seconds: state.started_at.elapsed().as_secs(),
        complaints_total: state.store.count(),
        intakes_committed: state.orchestrator.committed(),
    })
}

// ============================================================================
// Intake
// ============================================================================

/// POST /complaints — multipart intake form.
///
/// Fields: `citizen_name`, `citizen_phone`, `issue_type`, `address`,
/// `latitude`, `longitude`, `photo` (file), repeatable `context_flags`.
/// Missing or malformed fields fall through to pipeline validation, so the
/// citizen always gets a single consistent `InvalidSubmission` shape.
pub async fn submit_complaint(
    State(state): State<ApiState>,
    multipart: Multipart,
) -> Response {
    let submission = match read_submission(multipart).await {
        Ok(submission) => submission,
        Err(reason) => return ApiErrorResponse::bad_request(reason),
    };

    match state
        .orchestrator
        .process_intake(submission, state.cancel.clone())
        .await
    {
        Ok(complaint) => ApiResponse::created(complaint),
        Err(e) => ApiErrorResponse::from_orchestration(&e),
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<RawSubmission, String> {
    let mut submission = RawSubmission {
        citizen_name: String::new(),
        citizen_phone: String::new(),
        issue_type: String::new(),
        address: String::new(),
        latitude: f64::NAN,
        longitude: f64::NAN,
        photo: Vec::new(),
        context_flags: Default::default(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("malformed multipart body: {}", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "photo" => {
                submission.photo = field
                    .bytes()
                    .await
                    .map_err(|e| format!("could not read photo: {}", e))?
                    .to_vec();
            }
            "citizen_name" => submission.citizen_name = read_text(field).await?,
            "citizen_phone" => submission.citizen_phone = read_text(field).await?,
            "issue_type" => submission.issue_type = read_text(field).await?,
            "address" => submission.address = read_text(field).await?,
            "latitude" => {
                submission.latitude = parse_coord("latitude", &read_text(field).await?)?;
            }
            "longitude" => {
                submission.longitude = parse_coord("longitude", &read_text(field).await?)?;
            }
            "context_flags" => {
                let raw = read_text(field).await?;
                let flag: RiskFactor =
                    serde_json::from_value(serde_json::Value::String(raw.clone()))
                        .map_err(|_| format!("unknown context flag '{}'", raw))?;
                submission.context_flags.insert(flag);
            }
            // Unknown fields are ignored so form revisions stay compatible
            _ => {}
        }
    }

    Ok(submission)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, String> {
    field
        .text()
        .await
        .map_err(|e| format!("could not read field: {}", e))
}

fn parse_coord(label: &str, raw: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| format!("{} '{}' is not a number", label, raw))
}

// ============================================================================
// Tracking & transitions
// ============================================================================

pub async fn get_complaint(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    let id = ComplaintId::from(id);
    match state.store.get(&id) {
        Ok(complaint) => ApiResponse::ok(complaint),
        Err(e) => ApiErrorResponse::from_store(&e),
    }
}

/// Authority-side lifecycle transition request
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: Status,
    pub actor: String,
    #[serde(default)]
    pub note: Option<String>,
}

pub async fn transition_complaint(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response {
    if request.actor.trim().is_empty() {
        return ApiErrorResponse::bad_request("actor is required");
    }
    let id = ComplaintId::from(id);
    match state
        .store
        .transition(&id, request.status, &request.actor, request.note)
    {
        Ok(complaint) => ApiResponse::ok(complaint),
        Err(e) => ApiErrorResponse::from_store(&e),
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// Query parameters for the dashboard queue.
///
/// Enum values use the serialized names: `status=UnderReview`,
/// `tier=Critical`.
#[derive(Debug, Default, Deserialize)]
pub struct QueueQuery {
    pub status: Option<Status>,
    pub tier: Option<UrgencyTier>,
    pub min_risk: Option<u8>,
}

pub async fn query_complaints(
    State(state): State<ApiState>,
    Query(params): Query<QueueQuery>,
) -> Response {
    let filter = ComplaintFilter {
        status: params.status,
        min_risk: params.min_risk,
        tier: params.tier,
    };
    match state.store.query(&filter) {
        Ok(complaints) => ApiResponse::ok(complaints),
        Err(e) => {
            error!(error = %e, "queue query failed");
            ApiErrorResponse::from_store(&e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

pub async fn recent_complaints(
    State(state): State<ApiState>,
    Query(params): Query<RecentQuery>,
) -> Response {
    match state.store.recent(params.limit.unwrap_or(10)) {
        Ok(complaints) => ApiResponse::ok(complaints),
        Err(e) => ApiErrorResponse::from_store(&e),
    }
}

pub async fn get_stats(State(state): State<ApiState>) -> Response {
    match state.store.stats() {
        Ok(stats) => ApiResponse::ok(stats),
        Err(e) => ApiErrorResponse::from_store(&e),
    }
}
