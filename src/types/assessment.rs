//! Damage assessment types: DamageType, RiskFactor, DamageAssessment
//!
//! A `DamageAssessment` is produced by the vision collaborator and is
//! immutable once validated. All enum parsing happens at the ingestion
//! boundary so a hallucinated category or out-of-range severity becomes a
//! validation error instead of a corrupt record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lowest severity the vision collaborator may report.
pub const SEVERITY_MIN: u8 = 1;
/// Highest severity the vision collaborator may report.
pub const SEVERITY_MAX: u8 = 10;

// ============================================================================
// Damage categories
// ============================================================================

/// Category of civic damage recognised by the pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum DamageType {
    Pothole,
    WaterLeak,
    Streetlight,
    Drainage,
    Other,
}

impl std::fmt::Display for DamageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DamageType::Pothole => write!(f, "pothole"),
            DamageType::WaterLeak => write!(f, "water-leak"),
            DamageType::Streetlight => write!(f, "streetlight"),
            DamageType::Drainage => write!(f, "drainage"),
            DamageType::Other => write!(f, "other"),
        }
    }
}

// ============================================================================
// Risk factors
// ============================================================================

/// Context flag that raises the risk score of a complaint.
///
/// Declaration order is the order factors appear in the scoring breakdown
/// (sets of factors are `BTreeSet`, which sorts by this ordering).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RiskFactor {
    NearSchool,
    HeavyTraffic,
    WaterRelated,
    MonsoonExposure,
}

impl std::fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskFactor::NearSchool => write!(f, "near-school"),
            RiskFactor::HeavyTraffic => write!(f, "heavy-traffic"),
            RiskFactor::WaterRelated => write!(f, "water-related"),
            RiskFactor::MonsoonExposure => write!(f, "monsoon-exposure"),
        }
    }
}

// ============================================================================
// Damage assessment
// ============================================================================

/// Error raised when collaborator output fails boundary validation
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid assessment: {0}")]
pub struct InvalidAssessment(pub String);

/// Structured output of the vision collaborator, immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DamageAssessment {
    /// Detected damage category
    pub damage_type: DamageType,
    /// Severity on a 1-10 scale (validated at the boundary)
    pub severity: u8,
    /// Risk factors the collaborator detected in the image
    pub risk_factors: BTreeSet<RiskFactor>,
    /// Free-text description of the damage
    pub description: String,
}

impl DamageAssessment {
    /// Build a validated assessment. Severity outside 1-10 is rejected.
    pub fn new(
        damage_type: DamageType,
        severity: u8,
        risk_factors: BTreeSet<RiskFactor>,
        description: impl Into<String>,
    ) -> Result<Self, InvalidAssessment> {
        let assessment = Self {
            damage_type,
            severity,
            risk_factors,
            description: description.into(),
        };
        assessment.validate()?;
        Ok(assessment)
    }

    /// Check the severity range invariant.
    ///
    /// Called again by the risk engine before scoring, so a deserialized
    /// assessment that bypassed `new()` cannot reach the scorer.
    pub fn validate(&self) -> Result<(), InvalidAssessment> {
        if !(SEVERITY_MIN..=SEVERITY_MAX).contains(&self.severity) {
            return Err(InvalidAssessment(format!(
                "severity {} outside {}-{}",
                self.severity, SEVERITY_MIN, SEVERITY_MAX
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_bounds() {
        assert!(DamageAssessment::new(DamageType::Pothole, 1, BTreeSet::new(), "edge").is_ok());
        assert!(DamageAssessment::new(DamageType::Pothole, 10, BTreeSet::new(), "edge").is_ok());
        assert!(DamageAssessment::new(DamageType::Pothole, 0, BTreeSet::new(), "bad").is_err());
        assert!(DamageAssessment::new(DamageType::Pothole, 11, BTreeSet::new(), "bad").is_err());
    }

    #[test]
    fn test_damage_type_wire_format() {
        let json = serde_json::to_string(&DamageType::WaterLeak).unwrap();
        assert_eq!(json, "\"water-leak\"");
        let parsed: DamageType = serde_json::from_str("\"water-leak\"").unwrap();
        assert_eq!(parsed, DamageType::WaterLeak);
    }

    #[test]
    fn test_unknown_damage_type_rejected() {
        let parsed: Result<DamageType, _> = serde_json::from_str("\"sinkhole\"");
        assert!(parsed.is_err(), "unknown categories must not parse silently");
    }

    #[test]
    fn test_risk_factor_set_order_is_declaration_order() {
        let mut set = BTreeSet::new();
        set.insert(RiskFactor::MonsoonExposure);
        set.insert(RiskFactor::NearSchool);
        set.insert(RiskFactor::WaterRelated);
        let ordered: Vec<RiskFactor> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                RiskFactor::NearSchool,
                RiskFactor::WaterRelated,
                RiskFactor::MonsoonExposure
            ]
        );
    }
}
