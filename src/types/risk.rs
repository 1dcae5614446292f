//! Risk assessment types: UrgencyTier, ScoreComponent, RiskAssessment
//!
//! Produced once per complaint by the risk engine and kept immutable for
//! auditability. The breakdown records exactly how the score was reached.

use serde::{Deserialize, Serialize};

/// Minimum score for the Critical tier
pub const TIER_CRITICAL_MIN: u8 = 75;
/// Minimum score for the High tier
pub const TIER_HIGH_MIN: u8 = 50;
/// Minimum score for the Moderate tier
pub const TIER_MODERATE_MIN: u8 = 25;

/// Coarse urgency bucket derived from the risk score.
///
/// Ordered so `Low < Moderate < High < Critical` for queue comparisons.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UrgencyTier {
    Low,
    Moderate,
    High,
    Critical,
}

impl UrgencyTier {
    /// Derive the tier from a clamped 0-100 risk score.
    pub fn from_score(score: u8) -> Self {
        if score >= TIER_CRITICAL_MIN {
            UrgencyTier::Critical
        } else if score >= TIER_HIGH_MIN {
            UrgencyTier::High
        } else if score >= TIER_MODERATE_MIN {
            UrgencyTier::Moderate
        } else {
            UrgencyTier::Low
        }
    }
}

impl std::fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrgencyTier::Low => write!(f, "LOW"),
            UrgencyTier::Moderate => write!(f, "MODERATE"),
            UrgencyTier::High => write!(f, "HIGH"),
            UrgencyTier::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One line of the scoring audit trail: what contributed and how much
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreComponent {
    /// "severity-base" or a risk factor name
    pub factor: String,
    /// Points this component added before clamping
    pub points: u8,
}

/// Deterministic scoring result, immutable once produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    /// Risk score clamped to [0, 100]
    pub score: u8,
    /// Urgency tier derived from the score
    pub tier: UrgencyTier,
    /// Ordered contributing-factor breakdown: base first, then factors
    pub breakdown: Vec<ScoreComponent>,
}
