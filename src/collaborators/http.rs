//! HTTP implementations of the collaborator interfaces
//!
//! Vision and planning are JSON-over-HTTP services; notification is a
//! webhook POST. Per-attempt timeouts are owned by the retry layer
//! (`retry::call_with_retry`), so the clients here are built without one.

use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;

use super::{CollaboratorError, NotificationSink, PlanningCollaborator, PlanningContext, VisionCollaborator};
use crate::store::ComplaintEvent;
use crate::types::{ActionPlan, DamageAssessment, DamageType, RiskFactor};

fn transport(err: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Transport(err.to_string())
}

// ============================================================================
// Vision
// ============================================================================

/// Wire shape of the vision service response.
///
/// Enum fields use the kebab-case wire names; an unknown damage type or
/// risk factor fails deserialization, which surfaces as `Malformed` rather
/// than a silently corrupted record.
#[derive(Debug, Deserialize)]
struct VisionResponse {
    damage_type: DamageType,
    severity: u8,
    #[serde(default)]
    risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    description: String,
}

/// Vision collaborator over HTTP: photo bytes in the body, issue type as a
/// query parameter, structured assessment back as JSON.
pub struct HttpVisionCollaborator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpVisionCollaborator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl VisionCollaborator for HttpVisionCollaborator {
    async fn analyze(
        &self,
        photo: &[u8],
        issue_type: &str,
    ) -> Result<DamageAssessment, CollaboratorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("issue_type", issue_type)])
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(photo.to_vec())
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Transport(format!(
                "vision service returned {}",
                response.status()
            )));
        }

        let wire: VisionResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;

        DamageAssessment::new(
            wire.damage_type,
            wire.severity,
            wire.risk_factors.into_iter().collect(),
            wire.description,
        )
        .map_err(|e| CollaboratorError::Malformed(e.to_string()))
    }
}

// ============================================================================
// Planning
// ============================================================================

/// Planning collaborator over HTTP: planning context as JSON, plan back.
pub struct HttpPlanningCollaborator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPlanningCollaborator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PlanningCollaborator for HttpPlanningCollaborator {
    async fn plan(&self, context: &PlanningContext) -> Result<ActionPlan, CollaboratorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(context)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Transport(format!(
                "planning service returned {}",
                response.status()
            )));
        }

        let plan: ActionPlan = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;

        if plan.immediate_actions.is_empty() {
            return Err(CollaboratorError::Malformed(
                "plan has no immediate actions".to_string(),
            ));
        }
        if plan.budget_max_inr < plan.budget_min_inr {
            return Err(CollaboratorError::Malformed(
                "plan budget range is inverted".to_string(),
            ));
        }

        Ok(plan)
    }
}

// ============================================================================
// Notification
// ============================================================================

/// Notification sink that POSTs each complaint event to a webhook
/// (SMS gateway, municipal dashboard push, etc.).
pub struct WebhookNotificationSink {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotificationSink {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookNotificationSink {
    async fn notify(&self, event: &ComplaintEvent) -> Result<(), CollaboratorError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Transport(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}
