//! Aggregate dashboard statistics over the full store

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ComplaintStore, StoreError};
use crate::types::{PlanState, Status};

/// Read-only aggregate view of the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreStats {
    pub total: u64,
    /// Counts keyed by status name
    pub by_status: BTreeMap<String, u64>,
    /// Counts keyed by urgency tier name
    pub by_tier: BTreeMap<String, u64>,
    /// Counts keyed by damage type name
    pub by_damage_type: BTreeMap<String, u64>,
    /// Complaints still waiting on a backfilled plan
    pub plan_pending: u64,
    /// Resolved / total, 0.0 on an empty store
    pub resolution_rate: f64,
}

impl ComplaintStore {
    /// Compute aggregate stats over all records. Read-only, no side effects.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let complaints = self.scan()?;

        let mut by_status: BTreeMap<String, u64> = BTreeMap::new();
        let mut by_tier: BTreeMap<String, u64> = BTreeMap::new();
        let mut by_damage_type: BTreeMap<String, u64> = BTreeMap::new();
        let mut plan_pending = 0u64;
        let mut resolved = 0u64;

        for complaint in &complaints {
            *by_status.entry(complaint.status.to_string()).or_default() += 1;
            *by_tier.entry(complaint.risk.tier.to_string()).or_default() += 1;
            *by_damage_type
                .entry(complaint.assessment.damage_type.to_string())
                .or_default() += 1;
            if complaint.plan_state == PlanState::Pending {
                plan_pending += 1;
            }
            if complaint.status == Status::Resolved {
                resolved += 1;
            }
        }

        let total = complaints.len() as u64;
        let resolution_rate = if total > 0 {
            resolved as f64 / total as f64
        } else {
            0.0
        };

        Ok(StoreStats {
            total,
            by_status,
            by_tier,
            by_damage_type,
            plan_pending,
            resolution_rate,
        })
    }
}
