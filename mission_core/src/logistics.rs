//! One-shot mission briefing generation.
//!
//! Stateless: a briefing is a pure function of the expedition and the
//! catalog, produced without running a simulation. Callers use it to vet an
//! expedition before committing to a run, so the minimum-size rule is
//! enforced here independently of the simulator.

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::{Category, LocationCatalog};
use crate::config::MissionConfig;
use crate::pathfinder::{Pathfinder, Route};
use crate::risk::{RiskAssessment, RiskModel};
use crate::simulator::{Expedition, MissionError};

/// Projected resource cost of flying the route.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceEstimate {
    pub supplies: f64,
    pub fatigue: f64,
    pub integrity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetNote {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub base_risk: f64,
    pub access_complexity: u8,
    pub note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Briefing {
    pub route: Route,
    /// Travel time plus boots-on-ground overhead at intermediate stops.
    pub estimated_duration_hours: f64,
    pub risk: RiskAssessment,
    pub targets: Vec<TargetNote>,
    /// Deduplicated union of required gear across all targets, in visit order.
    pub gear_manifest: Vec<String>,
    pub resources: ResourceEstimate,
}

pub struct LogisticsCore {
    catalog: Arc<LocationCatalog>,
    pathfinder: Pathfinder,
    risk_model: RiskModel,
    config: MissionConfig,
}

impl LogisticsCore {
    pub fn new(
        catalog: Arc<LocationCatalog>,
        pathfinder: Pathfinder,
        risk_model: RiskModel,
        config: MissionConfig,
    ) -> Self {
        Self {
            catalog,
            pathfinder,
            risk_model,
            config,
        }
    }

    pub fn generate_brief(&self, expedition: &Expedition) -> Result<Briefing, MissionError> {
        expedition.validate()?;
        let route = self.pathfinder.compute_route(expedition.ids(), &[])?;
        let risk = self.risk_model.recompute(&route, &[]);

        let stops = expedition.len().saturating_sub(2) as f64;
        let estimated_duration_hours =
            route.total_travel_hours + stops * self.config.stop_overhead_hours;

        let mut targets = Vec::with_capacity(expedition.len());
        let mut gear_manifest: Vec<String> = Vec::new();
        for id in expedition.ids() {
            // compute_route already resolved every id
            let Some(loc) = self.catalog.get(id) else {
                continue;
            };
            for item in &loc.required_gear {
                if !gear_manifest.contains(item) {
                    gear_manifest.push(item.clone());
                }
            }
            targets.push(TargetNote {
                id: loc.id.as_str().to_string(),
                name: loc.name.clone(),
                category: loc.category,
                base_risk: loc.base_risk,
                access_complexity: loc.access_complexity,
                note: format!(
                    "{} objective, base risk {}/5, access complexity {}/5",
                    loc.category.as_str(),
                    loc.base_risk,
                    loc.access_complexity
                ),
            });
        }

        let resources = self.estimate_resources(&route);

        Ok(Briefing {
            route,
            estimated_duration_hours,
            risk,
            targets,
            gear_manifest,
            resources,
        })
    }

    /// Drain projection per leg, using the destination terrain as the
    /// conservative estimate for the whole leg.
    fn estimate_resources(&self, route: &Route) -> ResourceEstimate {
        let mut supplies = 0.0;
        let mut fatigue = 0.0;
        let mut integrity = 0.0;
        for leg in &route.legs {
            let category = self
                .catalog
                .get(&leg.to)
                .map(|loc| loc.category)
                .unwrap_or_default();
            let hours = leg.travel_time_hours;
            let mult = category.drain_multiplier();
            supplies += self.config.supplies_drain_per_hour * mult * hours;
            fatigue += self.config.fatigue_gain_per_hour * mult * hours;
            integrity += self.config.integrity_drain_per_hour
                * mult
                * category.integrity_multiplier()
                * hours;
        }
        ResourceEstimate {
            supplies,
            fatigue,
            integrity,
        }
    }
}
