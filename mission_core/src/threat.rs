//! Threat data model shared by Overwatch, the simulator and the pathfinder.

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatCategory {
    Weather,
    Traffic,
    Intel,
    Environment,
}

impl ThreatCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatCategory::Weather => "WEATHER",
            ThreatCategory::Traffic => "TRAFFIC",
            ThreatCategory::Intel => "INTEL",
            ThreatCategory::Environment => "ENVIRONMENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatSeverity {
    Low,
    Moderate,
    Critical,
}

/// What the mission must do about a threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatAction {
    None,
    RerouteRequired,
    AbortRequired,
}

/// Circular zone a threat renders hostile. Legs must keep clear of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatZone {
    pub center: LatLng,
    pub radius_km: f64,
}

impl ThreatZone {
    pub fn contains(&self, point: LatLng) -> bool {
        crate::geo::haversine_km(self.center, point) < self.radius_km
    }
}

/// A time-bounded hazard surfaced by Overwatch or injected out-of-band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub category: ThreatCategory,
    pub message: String,
    pub severity: ThreatSeverity,
    pub location: LatLng,
    pub radius_km: f64,
    pub risk_modifier: f64,
    pub action: ThreatAction,
}

impl Threat {
    pub fn zone(&self) -> ThreatZone {
        ThreatZone {
            center: self.location,
            radius_km: self.radius_km,
        }
    }
}

/// Queue wrapper stamping a threat with the mission epoch it was emitted for.
/// Envelopes from a superseded epoch are discarded by the consumer.
#[derive(Debug, Clone)]
pub struct ThreatEnvelope {
    pub epoch: u64,
    pub threat: Threat,
}

/// A threat currently counted into the mission risk picture.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveThreat {
    pub threat: Threat,
    pub expires_at_tick: u64,
}
