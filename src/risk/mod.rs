//! Risk engine — deterministic complaint scoring
//!
//! Pure function from a validated damage assessment plus context flags to a
//! bounded risk score and urgency tier. No I/O, no hidden state: identical
//! inputs always produce identical output, which is what makes the score
//! auditable and the queue ordering reproducible.
//!
//! ## Scoring
//!
//! - base = severity × 6, capped at 60
//! - NearSchool +20, HeavyTraffic +15, WaterRelated +10, MonsoonExposure +25
//! - sum clamped to [0, 100]
//!
//! The assessment's own detected factors are unioned with the caller's
//! context flags; a factor present in both counts once. The breakdown lists
//! the base first, then each factor in declaration order.

use std::collections::BTreeSet;

use crate::types::{
    DamageAssessment, InvalidAssessment, RiskAssessment, RiskFactor, ScoreComponent, UrgencyTier,
};

/// Points per severity unit for the base score
pub const BASE_POINTS_PER_SEVERITY: u16 = 6;
/// Cap on the severity-derived base score
pub const BASE_CAP: u16 = 60;
/// Clamp ceiling for the final score
pub const SCORE_MAX: u16 = 100;

/// Fixed weight each risk factor adds to the score.
pub fn factor_weight(factor: RiskFactor) -> u16 {
    match factor {
        RiskFactor::NearSchool => 20,
        RiskFactor::HeavyTraffic => 15,
        RiskFactor::WaterRelated => 10,
        RiskFactor::MonsoonExposure => 25,
    }
}

/// Compute the risk assessment for one complaint.
///
/// Rejects a malformed severity (outside 1-10) with `InvalidAssessment`
/// before any scoring. Valid input cannot fail.
pub fn compute_risk(
    assessment: &DamageAssessment,
    context_flags: &BTreeSet<RiskFactor>,
) -> Result<RiskAssessment, InvalidAssessment> {
    assessment.validate()?;

    let base = (assessment.severity as u16 * BASE_POINTS_PER_SEVERITY).min(BASE_CAP);

    let mut breakdown = vec![ScoreComponent {
        factor: "severity-base".to_string(),
        points: base as u8,
    }];

    // Union keeps each factor counted once; BTreeSet iteration gives the
    // fixed declaration order required for a stable audit trail.
    let factors: BTreeSet<RiskFactor> = assessment
        .risk_factors
        .union(context_flags)
        .copied()
        .collect();

    let mut total = base;
    for factor in factors {
        let weight = factor_weight(factor);
        total += weight;
        breakdown.push(ScoreComponent {
            factor: factor.to_string(),
            points: weight as u8,
        });
    }

    let score = total.min(SCORE_MAX) as u8;

    Ok(RiskAssessment {
        score,
        tier: UrgencyTier::from_score(score),
        breakdown,
    })
}
