//! The mission orchestrator.
//!
//! Owns the mission clock and all mutable mission state. The timeline is
//! cooperative: callers (server loop, tests) drive [`MissionSimulator::tick`]
//! explicitly, and every state mutation happens either inside a tick or
//! inside a synchronous command (`start`, `abort`, `pause`). Threats queue up
//! between ticks and are drained before any progress is made, so a pending
//! reroute is always resolved before that tick's records are published.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{LocationCatalog, LocationId};
use crate::config::MissionConfig;
use crate::overwatch::{Overwatch, RouteView};
use crate::pathfinder::{Leg, Pathfinder, Route, RouteError};
use crate::risk::{RiskAssessment, RiskModel};
use crate::telemetry::{RecordKind, TelemetryRecord, TelemetryStream};
use crate::threat::{ActiveThreat, Threat, ThreatAction, ThreatZone};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Aborted,
}

impl MissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Aborted)
    }
}

/// Why a mission ended in `Aborted`.
#[derive(Debug, Clone, Serialize)]
pub enum AbortCause {
    UserRequested,
    /// A new `start()` displaced the running mission.
    Superseded,
    ResourceDepletion,
    /// A threat carried an abort directive.
    ThreatDirective(Threat),
    /// No route cleared the avoidance constraints after this threat.
    RouteUnreachable(Threat),
}

impl AbortCause {
    fn note(&self) -> String {
        match self {
            AbortCause::UserRequested => "Mission aborted by user.".to_string(),
            AbortCause::Superseded => "Mission superseded by new tasking.".to_string(),
            AbortCause::ResourceDepletion => "Critical resource depletion.".to_string(),
            AbortCause::ThreatDirective(t) => format!("Abort directive: {}", t.message),
            AbortCause::RouteUnreachable(t) => {
                format!("No viable route around: {}", t.message)
            }
        }
    }

    pub fn threat(&self) -> Option<&Threat> {
        match self {
            AbortCause::ThreatDirective(t) | AbortCause::RouteUnreachable(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpeditionFault {
    #[error("needs at least two targets, got {0}")]
    TooFewTargets(usize),
    #[error("target `{0}` listed more than once")]
    DuplicateTarget(LocationId),
}

#[derive(Debug, Error)]
pub enum MissionError {
    #[error("invalid expedition: {0}")]
    InvalidExpedition(ExpeditionFault),
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Ordered target list chosen by the caller. The simulator keeps its own
/// copy; the caller's list is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expedition {
    ids: Vec<LocationId>,
}

impl Expedition {
    pub fn new(ids: Vec<LocationId>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[LocationId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Simulation eligibility: at least two targets, no repeats.
    pub fn validate(&self) -> Result<(), MissionError> {
        if self.ids.len() < 2 {
            return Err(MissionError::InvalidExpedition(
                ExpeditionFault::TooFewTargets(self.ids.len()),
            ));
        }
        let mut seen = HashSet::new();
        for id in &self.ids {
            if !seen.insert(id) {
                return Err(MissionError::InvalidExpedition(
                    ExpeditionFault::DuplicateTarget(id.clone()),
                ));
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for Expedition {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|s| LocationId(s.into())).collect())
    }
}

#[derive(Debug, Clone)]
struct MissionState {
    status: MissionStatus,
    tick: u64,
    sim_minutes: f64,
    expedition: Vec<LocationId>,
    route: Option<Route>,
    completed_legs: usize,
    progress_on_leg: f64,
    active_threats: Vec<ActiveThreat>,
    risk: RiskAssessment,
    supplies: f64,
    fatigue: f64,
    integrity: f64,
    abort_cause: Option<AbortCause>,
}

impl Default for MissionState {
    fn default() -> Self {
        Self {
            status: MissionStatus::Idle,
            tick: 0,
            sim_minutes: 0.0,
            expedition: Vec::new(),
            route: None,
            completed_legs: 0,
            progress_on_leg: 0.0,
            active_threats: Vec::new(),
            risk: RiskAssessment::default(),
            supplies: 100.0,
            fatigue: 0.0,
            integrity: 100.0,
            abort_cause: None,
        }
    }
}

/// Read-only view of the mission state for HUDs and tests.
#[derive(Debug, Clone, Serialize)]
pub struct MissionSnapshot {
    pub status: MissionStatus,
    pub epoch: u64,
    pub tick: u64,
    pub sim_minutes: f64,
    pub current_leg: usize,
    pub progress_on_leg: f64,
    pub route: Option<Route>,
    pub risk: RiskAssessment,
    pub active_threats: Vec<ActiveThreat>,
    pub supplies: f64,
    pub fatigue: f64,
    pub integrity: f64,
    pub abort_cause: Option<AbortCause>,
}

pub struct MissionSimulator {
    config: MissionConfig,
    catalog: Arc<LocationCatalog>,
    pathfinder: Pathfinder,
    risk_model: RiskModel,
    overwatch: Overwatch,
    telemetry: Arc<TelemetryStream>,
    state: MissionState,
    epoch: u64,
}

impl MissionSimulator {
    pub fn new(
        config: MissionConfig,
        catalog: Arc<LocationCatalog>,
        pathfinder: Pathfinder,
        risk_model: RiskModel,
        overwatch: Overwatch,
        telemetry: Arc<TelemetryStream>,
    ) -> Self {
        Self {
            config,
            catalog,
            pathfinder,
            risk_model,
            overwatch,
            telemetry,
            state: MissionState::default(),
            epoch: 0,
        }
    }

    pub fn status(&self) -> MissionStatus {
        self.state.status
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn telemetry(&self) -> &Arc<TelemetryStream> {
        &self.telemetry
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    pub fn state(&self) -> MissionSnapshot {
        MissionSnapshot {
            status: self.state.status,
            epoch: self.epoch,
            tick: self.state.tick,
            sim_minutes: self.state.sim_minutes,
            current_leg: self.state.completed_legs,
            progress_on_leg: self.state.progress_on_leg,
            route: self.state.route.clone(),
            risk: self.state.risk,
            active_threats: self.state.active_threats.clone(),
            supplies: self.state.supplies,
            fatigue: self.state.fatigue,
            integrity: self.state.integrity,
            abort_cause: self.state.abort_cause.clone(),
        }
    }

    /// Begins a fresh mission. A mission already in flight is aborted first,
    /// its Overwatch epoch retired, so no stale tick or threat can touch the
    /// new run. Validation failures leave existing state untouched.
    pub fn start(&mut self, expedition: Expedition) -> Result<(), MissionError> {
        expedition.validate()?;
        let route = self.pathfinder.compute_route(expedition.ids(), &[])?;

        if matches!(
            self.state.status,
            MissionStatus::Running | MissionStatus::Paused
        ) {
            self.finish_aborted(AbortCause::Superseded);
        }

        self.epoch += 1;
        let risk = self.risk_model.recompute(&route, &[]);
        self.state = MissionState {
            status: MissionStatus::Running,
            expedition: expedition.ids().to_vec(),
            route: Some(route),
            risk,
            ..MissionState::default()
        };
        self.overwatch.arm(self.epoch);

        info!(
            epoch = self.epoch,
            targets = self.state.expedition.len(),
            risk_score = self.state.risk.score,
            "mission.started"
        );
        self.publish(
            RecordKind::MissionStarted,
            None,
            "Mission simulation initialized. Systems nominal.",
        );
        Ok(())
    }

    /// Advances the mission clock by one scheduling interval. No-op unless
    /// `Running`. Queued threats are drained and resolved before any leg
    /// progress, so reroutes land inside the tick that triggered them.
    pub fn tick(&mut self) {
        if self.state.status != MissionStatus::Running {
            return;
        }
        self.state.tick += 1;
        self.state.sim_minutes += self.config.tick_minutes;

        self.resolve_threats();
        if self.state.status != MissionStatus::Running {
            return;
        }
        self.expire_threats();
        self.advance_progress();
        if self.state.status != MissionStatus::Running {
            return;
        }
        self.apply_resource_drain();
        if self.state.status != MissionStatus::Running {
            return;
        }
        self.recompute_risk();
        if let Some(view) = self.route_view() {
            self.overwatch.observe_tick(self.state.tick, &view);
        }
    }

    /// Manual abort. Idempotent: terminal and idle states are left alone.
    pub fn abort(&mut self) {
        if matches!(
            self.state.status,
            MissionStatus::Running | MissionStatus::Paused
        ) {
            self.finish_aborted(AbortCause::UserRequested);
        }
    }

    pub fn pause(&mut self) {
        if self.state.status == MissionStatus::Running {
            self.state.status = MissionStatus::Paused;
            info!(tick = self.state.tick, "mission.paused");
            self.publish(RecordKind::Advisory, None, "Simulation paused.");
        }
    }

    pub fn resume(&mut self) {
        if self.state.status == MissionStatus::Paused {
            self.state.status = MissionStatus::Running;
            info!(tick = self.state.tick, "mission.resumed");
            self.publish(RecordKind::Advisory, None, "Simulation resumed.");
        }
    }

    /// Routes an out-of-band threat through the same resolution path as
    /// organic Overwatch emissions. Takes effect on the next tick.
    pub fn inject_threat(&self, threat: Threat) {
        self.overwatch.inject(threat);
    }

    fn resolve_threats(&mut self) {
        let pending = self.overwatch.drain();
        if pending.is_empty() {
            return;
        }

        let mut fresh = Vec::new();
        for envelope in pending {
            if envelope.epoch != self.epoch {
                warn!(
                    stale_epoch = envelope.epoch,
                    current_epoch = self.epoch,
                    "mission.stale_threat_discarded"
                );
                continue;
            }
            fresh.push(envelope.threat);
        }
        if fresh.is_empty() {
            return;
        }

        // Abort directives outrank reroute demands in the same window.
        if let Some(threat) = fresh
            .iter()
            .find(|t| t.action == ThreatAction::AbortRequired)
            .cloned()
        {
            self.finish_aborted(AbortCause::ThreatDirective(threat));
            return;
        }

        let expires_at_tick = self.state.tick + self.config.threat_ttl_ticks;
        let mut reroute_trigger: Option<Threat> = None;
        for threat in fresh {
            info!(
                category = threat.category.as_str(),
                severity = ?threat.severity,
                action = ?threat.action,
                risk_modifier = threat.risk_modifier,
                "mission.threat_registered"
            );
            if threat.action == ThreatAction::RerouteRequired {
                reroute_trigger = Some(threat.clone());
            }
            self.state.active_threats.push(ActiveThreat {
                threat,
                expires_at_tick,
            });
        }
        self.recompute_risk();

        if let Some(trigger) = reroute_trigger {
            self.reroute(trigger);
        }
    }

    /// Replaces the remaining legs with a route that clears every active
    /// reroute-mandating zone. Completed legs are kept; progress on the
    /// interrupted leg restarts with the course correction. An unreachable
    /// route is a forced abort, not a retry.
    fn reroute(&mut self, trigger: Threat) {
        let remaining_ids: Vec<LocationId> =
            self.state.expedition[self.state.completed_legs..].to_vec();
        let avoid: Vec<ThreatZone> = self
            .state
            .active_threats
            .iter()
            .filter(|a| a.threat.action == ThreatAction::RerouteRequired)
            .map(|a| a.threat.zone())
            .collect();

        match self.pathfinder.compute_route(&remaining_ids, &avoid) {
            Ok(tail) => {
                let Some(route) = self.state.route.as_ref() else {
                    debug_assert!(false, "reroute fired without an active route");
                    warn!("mission.reroute_skipped=no_active_route");
                    return;
                };
                let mut legs: Vec<Leg> = route.legs[..self.state.completed_legs].to_vec();
                legs.extend(tail.legs);
                self.state.route = Some(Route::from_legs(legs));
                self.state.progress_on_leg = 0.0;
                self.recompute_risk();
                info!(
                    avoid_zones = avoid.len(),
                    risk_score = self.state.risk.score,
                    "mission.rerouted"
                );
                self.publish(
                    RecordKind::Reroute,
                    Some(trigger),
                    "Course correction applied.",
                );
            }
            Err(err) => {
                warn!(error = %err, "mission.reroute_failed");
                self.finish_aborted(AbortCause::RouteUnreachable(trigger));
            }
        }
    }

    fn expire_threats(&mut self) {
        let tick = self.state.tick;
        let before = self.state.active_threats.len();
        // Expiry never un-reroutes; the corrected course is kept.
        self.state.active_threats.retain(|a| a.expires_at_tick > tick);
        let expired = before - self.state.active_threats.len();
        if expired > 0 {
            debug!(expired, "mission.threats_expired");
            self.recompute_risk();
        }
    }

    fn advance_progress(&mut self) {
        let mut budget_hours = self.config.tick_hours();
        loop {
            let Some(route) = self.state.route.as_ref() else {
                return;
            };
            let Some(leg) = route.legs.get(self.state.completed_legs) else {
                return;
            };
            let travel = leg.travel_time_hours.max(1e-9);
            let to_id = leg.to.clone();
            let legs_total = route.legs.len();

            let remaining_hours = (1.0 - self.state.progress_on_leg) * travel;
            if budget_hours < remaining_hours {
                self.state.progress_on_leg += budget_hours / travel;
                return;
            }

            // Leg complete; carry the overshoot into the next one.
            budget_hours -= remaining_hours;
            self.state.completed_legs += 1;
            self.state.progress_on_leg = 0.0;

            let name = self
                .catalog
                .get(&to_id)
                .map(|l| l.name.clone())
                .unwrap_or_else(|| to_id.to_string());
            info!(target = %to_id, legs_done = self.state.completed_legs, "mission.leg_complete");
            self.publish(
                RecordKind::LegComplete,
                None,
                format!("Reached objective: {name}"),
            );

            if self.state.completed_legs == legs_total {
                self.finish_completed();
                return;
            }
        }
    }

    fn apply_resource_drain(&mut self) {
        let category = self
            .state
            .route
            .as_ref()
            .and_then(|r| r.legs.get(self.state.completed_legs))
            .and_then(|leg| self.catalog.get(&leg.to))
            .map(|loc| loc.category)
            .unwrap_or_default();

        let hours = self.config.tick_hours();
        let mult = category.drain_multiplier();
        self.state.supplies =
            (self.state.supplies - self.config.supplies_drain_per_hour * mult * hours).max(0.0);
        self.state.fatigue =
            (self.state.fatigue + self.config.fatigue_gain_per_hour * mult * hours).min(100.0);
        self.state.integrity = (self.state.integrity
            - self.config.integrity_drain_per_hour
                * mult
                * category.integrity_multiplier()
                * hours)
            .max(0.0);

        if self.state.supplies <= 0.0 || self.state.integrity <= 0.0 {
            self.finish_aborted(AbortCause::ResourceDepletion);
        }
    }

    fn recompute_risk(&mut self) {
        if let Some(route) = &self.state.route {
            let threats: Vec<Threat> = self
                .state
                .active_threats
                .iter()
                .map(|a| a.threat.clone())
                .collect();
            self.state.risk = self.risk_model.recompute(route, &threats);
        }
    }

    fn route_view(&self) -> Option<RouteView> {
        let route = self.state.route.as_ref()?;
        let leg = route.legs.get(self.state.completed_legs)?;

        let mut remaining = Vec::new();
        for l in &route.legs[self.state.completed_legs..] {
            for (i, wp) in l.waypoints.iter().enumerate() {
                if i == 0 && !remaining.is_empty() {
                    continue; // joints are shared with the previous leg
                }
                remaining.push(*wp);
            }
        }

        Some(RouteView {
            leg_start: *leg.waypoints.first()?,
            leg_end: *leg.waypoints.last()?,
            remaining,
            current_risk: self.state.risk.score,
        })
    }

    fn finish_completed(&mut self) {
        self.state.status = MissionStatus::Completed;
        self.overwatch.disarm();
        info!(
            tick = self.state.tick,
            sim_minutes = self.state.sim_minutes,
            "mission.complete"
        );
        self.publish(RecordKind::MissionComplete, None, "Mission accomplished.");
    }

    fn finish_aborted(&mut self, cause: AbortCause) {
        if self.state.status.is_terminal() {
            return;
        }
        self.overwatch.disarm();
        self.state.status = MissionStatus::Aborted;
        let note = cause.note();
        let threat = cause.threat().cloned();
        warn!(tick = self.state.tick, note = %note, "mission.aborted");
        self.state.abort_cause = Some(cause);
        self.publish(RecordKind::MissionAborted, threat, note);
    }

    fn publish(&self, kind: RecordKind, threat: Option<Threat>, note: impl Into<String>) {
        self.telemetry.publish(TelemetryRecord {
            tick: self.state.tick,
            sim_minutes: self.state.sim_minutes,
            kind,
            route: self.state.route.clone(),
            risk: self.state.risk,
            threat,
            note: note.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overwatch::ThreatPolicy;

    /// Policy that never surfaces anything; tests inject threats explicitly.
    struct Silent;

    impl ThreatPolicy for Silent {
        fn draw(&mut self, _tick: u64, _view: &RouteView) -> Option<Threat> {
            None
        }
    }

    fn simulator(config: MissionConfig) -> MissionSimulator {
        let catalog = LocationCatalog::builtin();
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
            Overwatch::new(Box::new(Silent)),
            TelemetryStream::new(),
        )
    }

    fn expedition(ids: &[&str]) -> Expedition {
        ids.iter().copied().collect()
    }

    #[test]
    fn too_few_targets_leaves_state_idle() {
        let mut sim = simulator(MissionConfig::default());
        let err = sim.start(expedition(&["caracol"])).unwrap_err();
        assert!(matches!(
            err,
            MissionError::InvalidExpedition(ExpeditionFault::TooFewTargets(1))
        ));
        assert_eq!(sim.status(), MissionStatus::Idle);
        assert!(sim.telemetry().is_empty());
    }

    #[test]
    fn duplicate_target_is_invalid() {
        let mut sim = simulator(MissionConfig::default());
        let err = sim
            .start(expedition(&["caracol", "atm-cave", "caracol"]))
            .unwrap_err();
        assert!(matches!(
            err,
            MissionError::InvalidExpedition(ExpeditionFault::DuplicateTarget(_))
        ));
        assert_eq!(sim.status(), MissionStatus::Idle);
    }

    #[test]
    fn paused_mission_ignores_ticks() {
        let mut sim = simulator(MissionConfig::default());
        sim.start(expedition(&["xunantunich", "caracol"])).unwrap();
        sim.pause();
        let before = sim.state();
        sim.tick();
        sim.tick();
        let after = sim.state();
        assert_eq!(after.status, MissionStatus::Paused);
        assert_eq!(after.tick, before.tick);
        assert_eq!(after.progress_on_leg, before.progress_on_leg);

        sim.resume();
        sim.tick();
        assert!(sim.state().progress_on_leg > 0.0);
    }

    #[test]
    fn resource_depletion_forces_abort() {
        let config = MissionConfig {
            supplies_drain_per_hour: 10_000.0,
            ..MissionConfig::default()
        };
        let mut sim = simulator(config);
        sim.start(expedition(&["xunantunich", "great-blue-hole"]))
            .unwrap();
        sim.tick();
        let snapshot = sim.state();
        assert_eq!(snapshot.status, MissionStatus::Aborted);
        assert!(matches!(
            snapshot.abort_cause,
            Some(AbortCause::ResourceDepletion)
        ));
    }

    #[test]
    fn abort_is_idempotent() {
        let mut sim = simulator(MissionConfig::default());
        sim.start(expedition(&["xunantunich", "caracol"])).unwrap();
        sim.abort();
        assert_eq!(sim.status(), MissionStatus::Aborted);
        let records_after_first = sim.telemetry().len();
        sim.abort();
        sim.abort();
        assert_eq!(sim.status(), MissionStatus::Aborted);
        assert_eq!(sim.telemetry().len(), records_after_first);
    }

    #[test]
    fn restart_supersedes_running_mission() {
        let mut sim = simulator(MissionConfig::default());
        sim.start(expedition(&["xunantunich", "caracol"])).unwrap();
        let first_epoch = sim.epoch();
        sim.start(expedition(&["atm-cave", "barton-creek-cave"]))
            .unwrap();
        assert_eq!(sim.epoch(), first_epoch + 1);
        assert_eq!(sim.status(), MissionStatus::Running);

        let kinds: Vec<RecordKind> = sim.telemetry().history().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecordKind::MissionStarted,
                RecordKind::MissionAborted,
                RecordKind::MissionStarted,
            ]
        );
    }
}
