//! Aggregate mission risk scoring.

use serde::{Deserialize, Serialize};

use crate::pathfinder::Route;
use crate::threat::Threat;

/// Coarse classification derived from the numeric risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskTier {
    pub fn from_score(score: f64) -> Self {
        if score < 25.0 {
            RiskTier::Low
        } else if score < 60.0 {
            RiskTier::Moderate
        } else if score < 85.0 {
            RiskTier::High
        } else {
            RiskTier::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Moderate => "MODERATE",
            RiskTier::High => "HIGH",
            RiskTier::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub tier: RiskTier,
}

impl Default for RiskAssessment {
    fn default() -> Self {
        Self {
            score: 0.0,
            tier: RiskTier::Low,
        }
    }
}

/// Pure scoring function: route base risk plus all active threat modifiers,
/// clamped to `[0, 100]`. No stored state, safe to call from any reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskModel;

impl RiskModel {
    pub fn recompute(&self, route: &Route, active_threats: &[Threat]) -> RiskAssessment {
        let modifier_sum: f64 = active_threats.iter().map(|t| t.risk_modifier).sum();
        let score = (route.base_risk + modifier_sum).clamp(0.0, 100.0);
        RiskAssessment {
            score,
            tier: RiskTier::from_score(score),
        }
    }
}
