//! Mission simulation and tactical overwatch engine.
//!
//! Headless core of the expedition planner: computes routes over the target
//! catalog, advances a deterministic mission clock, injects stochastic
//! threats that can force rerouting or abort, scores aggregate risk, and
//! fans out an ordered telemetry feed that observers consume without ever
//! touching simulation state. Drive it by calling [`MissionSimulator::tick`]
//! from a scheduler of your choosing; no wall-clock timers live in here.

mod catalog;
mod config;
pub mod geo;
mod logistics;
mod overwatch;
mod pathfinder;
mod risk;
mod simulator;
pub mod stream_server;
mod telemetry;
mod threat;

use std::sync::Arc;

pub use catalog::{Category, Location, LocationCatalog, LocationId, BUILTIN_LOCATIONS};
pub use config::{MissionConfig, OverwatchConfig};
pub use geo::LatLng;
pub use logistics::{Briefing, LogisticsCore, ResourceEstimate, TargetNote};
pub use overwatch::{Overwatch, RandomThreatPolicy, RouteView, ThreatPolicy};
pub use pathfinder::{Leg, Pathfinder, Route, RouteError};
pub use risk::{RiskAssessment, RiskModel, RiskTier};
pub use simulator::{
    AbortCause, Expedition, ExpeditionFault, MissionError, MissionSimulator, MissionSnapshot,
    MissionStatus,
};
pub use telemetry::{
    RecordKind, SubscriberId, TelemetryRecord, TelemetryStream, TelemetrySubscription,
};
pub use threat::{
    ActiveThreat, Threat, ThreatAction, ThreatCategory, ThreatEnvelope, ThreatSeverity,
    ThreatZone,
};

/// Wires a simulator against the builtin catalog and the default stochastic
/// threat policy. Components stay individually constructible for callers
/// that need to swap the policy or the catalog.
pub fn build_engine(config: MissionConfig) -> MissionSimulator {
    let catalog = LocationCatalog::builtin();
    build_engine_with(
        config.clone(),
        Arc::clone(&catalog),
        Overwatch::with_config(config.overwatch),
    )
}

/// Same wiring with a caller-supplied catalog and Overwatch instance.
pub fn build_engine_with(
    config: MissionConfig,
    catalog: Arc<LocationCatalog>,
    overwatch: Overwatch,
) -> MissionSimulator {
    let pathfinder = Pathfinder::new(
        Arc::clone(&catalog),
        config.base_speed_kmh,
        config.detour_margin,
    );
    MissionSimulator::new(
        config,
        catalog,
        pathfinder,
        RiskModel,
        overwatch,
        TelemetryStream::new(),
    )
}

/// Briefing generator wired against the builtin catalog.
pub fn build_logistics(config: MissionConfig) -> LogisticsCore {
    let catalog = LocationCatalog::builtin();
    let pathfinder = Pathfinder::new(
        Arc::clone(&catalog),
        config.base_speed_kmh,
        config.detour_margin,
    );
    LogisticsCore::new(catalog, pathfinder, RiskModel, config)
}
