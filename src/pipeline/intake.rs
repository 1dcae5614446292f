//! Raw citizen submission and fail-fast validation

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::{GeoPoint, RiskFactor};

/// Everything the intake form hands the pipeline, unvalidated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub citizen_name: String,
    #[serde(default)]
    pub citizen_phone: String,
    /// Citizen's own categorisation, passed to the vision collaborator as a
    /// hint; the validated category comes back from vision
    pub issue_type: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Raw photo bytes
    #[serde(default)]
    pub photo: Vec<u8>,
    /// Ward-level context flags (e.g. a monsoon advisory) applied on top of
    /// whatever the vision collaborator detects
    #[serde(default)]
    pub context_flags: BTreeSet<RiskFactor>,
}

impl RawSubmission {
    /// Fail-fast intake checks: location present, photo present, issue type
    /// non-empty. Returns the reason for rejection, not an error enum — the
    /// orchestrator wraps it in `InvalidSubmission`.
    pub fn validate(&self) -> Result<(), String> {
        if self.issue_type.trim().is_empty() {
            return Err("issue type is empty".to_string());
        }
        if self.photo.is_empty() {
            return Err("photo is missing".to_string());
        }
        if self.address.trim().is_empty() {
            return Err("address is empty".to_string());
        }
        if !self.point().is_valid() {
            return Err(format!(
                "coordinates ({}, {}) are not a valid location",
                self.latitude, self.longitude
            ));
        }
        Ok(())
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}
