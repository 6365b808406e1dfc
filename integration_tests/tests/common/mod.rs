#![allow(dead_code)]

use mission_core::{
    build_engine_with, Expedition, LatLng, LocationCatalog, MissionConfig, MissionSimulator,
    Overwatch, RecordKind, RouteView, Threat, ThreatAction, ThreatCategory, ThreatPolicy,
    ThreatSeverity,
};

/// Policy that never surfaces anything on its own, so tests stay fully
/// scripted through `inject_threat`.
pub struct Silent;

impl ThreatPolicy for Silent {
    fn draw(&mut self, _tick: u64, _view: &RouteView) -> Option<Threat> {
        None
    }
}

pub fn quiet_engine(config: MissionConfig) -> MissionSimulator {
    build_engine_with(
        config,
        LocationCatalog::builtin(),
        Overwatch::new(Box::new(Silent)),
    )
}

pub fn expedition(ids: &[&str]) -> Expedition {
    ids.iter().copied().collect()
}

pub fn threat_at(location: LatLng, radius_km: f64, action: ThreatAction) -> Threat {
    Threat {
        category: ThreatCategory::Weather,
        message: "Flash flood warning".to_string(),
        severity: ThreatSeverity::Moderate,
        location,
        radius_km,
        risk_modifier: 30.0,
        action,
    }
}

pub fn record_kinds(sim: &MissionSimulator) -> Vec<RecordKind> {
    sim.telemetry().history().iter().map(|r| r.kind).collect()
}

/// Drives ticks until the mission leaves `Running`, bounded so a broken
/// progress loop fails the test instead of hanging it.
pub fn run_to_terminal(sim: &mut MissionSimulator, max_ticks: u32) {
    for _ in 0..max_ticks {
        if sim.status().is_terminal() {
            return;
        }
        sim.tick();
    }
    assert!(
        sim.status().is_terminal(),
        "mission still {:?} after {max_ticks} ticks",
        sim.status()
    );
}
