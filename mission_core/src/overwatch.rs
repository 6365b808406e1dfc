//! Overwatch: the background threat emitter.
//!
//! While armed, Overwatch watches each scheduling tick and may surface a new
//! threat near the current leg. Emission goes through a single-consumer FIFO
//! queue that the simulator drains at the start of its next tick, so threats
//! are never lost or double-processed. Every envelope carries the arming
//! epoch; the consumer discards envelopes from a superseded run.
//!
//! The emission model is a pluggable, seedable policy rather than a fixed
//! distribution. The default policy draws per tick with probability
//! `base_probability + current_risk * risk_weight` and derives the required
//! action from whether the surfaced zone actually cuts the remaining route.

use crossbeam_channel::{unbounded, Receiver, Sender};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::OverwatchConfig;
use crate::geo::{self, LatLng};
use crate::threat::{
    Threat, ThreatAction, ThreatCategory, ThreatEnvelope, ThreatSeverity,
};

/// What the emitter is allowed to see of the in-flight mission.
#[derive(Debug, Clone)]
pub struct RouteView {
    pub leg_start: LatLng,
    pub leg_end: LatLng,
    /// Waypoints still ahead of the unit, current leg included.
    pub remaining: Vec<LatLng>,
    pub current_risk: f64,
}

impl RouteView {
    /// True when the circle cuts any remaining segment of the route.
    pub fn intersects(&self, center: LatLng, radius_km: f64) -> bool {
        self.remaining
            .windows(2)
            .any(|pair| geo::point_segment_km(center, pair[0], pair[1]) < radius_km)
    }
}

/// Decides whether a threat surfaces on a given tick, and builds it if so.
pub trait ThreatPolicy: Send {
    fn draw(&mut self, tick: u64, view: &RouteView) -> Option<Threat>;
}

const TEMPLATES: [(ThreatCategory, ThreatSeverity, &str); 4] = [
    (
        ThreatCategory::Weather,
        ThreatSeverity::Moderate,
        "Flash flood warning",
    ),
    (
        ThreatCategory::Traffic,
        ThreatSeverity::Low,
        "Road obstruction reported",
    ),
    (
        ThreatCategory::Intel,
        ThreatSeverity::Critical,
        "High-value target activity",
    ),
    (
        ThreatCategory::Environment,
        ThreatSeverity::Moderate,
        "Seismic tremor detected",
    ),
];

/// Default stochastic policy, reproducible from a config seed.
pub struct RandomThreatPolicy {
    config: OverwatchConfig,
    rng: ChaCha8Rng,
}

impl RandomThreatPolicy {
    pub fn new(config: OverwatchConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self { config, rng }
    }
}

impl ThreatPolicy for RandomThreatPolicy {
    fn draw(&mut self, _tick: u64, view: &RouteView) -> Option<Threat> {
        let probability = (self.config.base_probability
            + view.current_risk * self.config.risk_weight)
            .clamp(0.0, 1.0);
        if !self.rng.gen_bool(probability) {
            return None;
        }

        let (category, severity, message) = TEMPLATES[self.rng.gen_range(0..TEMPLATES.len())];

        // Materialize somewhere along the current leg, jittered off to a side.
        let along = self.rng.gen_range(0.0..=1.0);
        let anchor = geo::lerp(view.leg_start, view.leg_end, along);
        let jitter = self.config.placement_jitter_km;
        let east = self.rng.gen_range(-jitter..=jitter);
        let north = self.rng.gen_range(-jitter..=jitter);
        let location = geo::offset_km(anchor, east, north);

        let radius_km = self
            .rng
            .gen_range(self.config.radius_km.0..=self.config.radius_km.1);
        let risk_modifier = self
            .rng
            .gen_range(self.config.risk_modifier.0..=self.config.risk_modifier.1);

        let action = if view.intersects(location, radius_km) {
            if severity == ThreatSeverity::Critical && self.rng.gen_bool(self.config.abort_weight)
            {
                ThreatAction::AbortRequired
            } else {
                ThreatAction::RerouteRequired
            }
        } else {
            ThreatAction::None
        };

        Some(Threat {
            category,
            message: message.to_string(),
            severity,
            location,
            radius_km,
            risk_modifier,
            action,
        })
    }
}

/// Armed/disarmed emitter plus both ends of the threat queue.
pub struct Overwatch {
    policy: Box<dyn ThreatPolicy>,
    tx: Sender<ThreatEnvelope>,
    rx: Receiver<ThreatEnvelope>,
    armed_epoch: Option<u64>,
}

impl Overwatch {
    pub fn new(policy: Box<dyn ThreatPolicy>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            policy,
            tx,
            rx,
            armed_epoch: None,
        }
    }

    pub fn with_config(config: OverwatchConfig) -> Self {
        Self::new(Box::new(RandomThreatPolicy::new(config)))
    }

    pub fn arm(&mut self, epoch: u64) {
        self.armed_epoch = Some(epoch);
        debug!(epoch, "overwatch.armed");
    }

    pub fn disarm(&mut self) {
        if let Some(epoch) = self.armed_epoch.take() {
            debug!(epoch, "overwatch.disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed_epoch.is_some()
    }

    /// Gives the policy one chance to surface a threat for this tick.
    /// No-op while disarmed.
    pub fn observe_tick(&mut self, tick: u64, view: &RouteView) {
        let Some(epoch) = self.armed_epoch else {
            return;
        };
        if let Some(threat) = self.policy.draw(tick, view) {
            info!(
                category = threat.category.as_str(),
                severity = ?threat.severity,
                action = ?threat.action,
                radius_km = threat.radius_km,
                "overwatch.threat_surfaced"
            );
            let _ = self.tx.send(ThreatEnvelope { epoch, threat });
        }
    }

    /// Routes an out-of-band threat through the same queue as organic
    /// emissions. Dropped with a warning while disarmed.
    pub fn inject(&self, threat: Threat) {
        match self.armed_epoch {
            Some(epoch) => {
                let _ = self.tx.send(ThreatEnvelope { epoch, threat });
            }
            None => warn!(
                category = threat.category.as_str(),
                "overwatch.injection_dropped=disarmed"
            ),
        }
    }

    /// Everything queued since the last drain, in emission order.
    pub fn drain(&self) -> Vec<ThreatEnvelope> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emits a fixed sequence of threats, one per observed tick.
    struct Scripted {
        queue: Vec<Threat>,
    }

    impl ThreatPolicy for Scripted {
        fn draw(&mut self, _tick: u64, _view: &RouteView) -> Option<Threat> {
            if self.queue.is_empty() {
                None
            } else {
                Some(self.queue.remove(0))
            }
        }
    }

    fn threat(message: &str) -> Threat {
        Threat {
            category: ThreatCategory::Intel,
            message: message.to_string(),
            severity: ThreatSeverity::Critical,
            location: LatLng::new(17.0, -88.5),
            radius_km: 10.0,
            risk_modifier: 30.0,
            action: ThreatAction::None,
        }
    }

    fn view() -> RouteView {
        RouteView {
            leg_start: LatLng::new(17.089, -89.141),
            leg_end: LatLng::new(16.76389, -89.1175),
            remaining: vec![
                LatLng::new(17.089, -89.141),
                LatLng::new(16.76389, -89.1175),
            ],
            current_risk: 10.0,
        }
    }

    #[test]
    fn disarmed_overwatch_never_emits() {
        let mut overwatch = Overwatch::new(Box::new(Scripted {
            queue: vec![threat("a")],
        }));
        overwatch.observe_tick(1, &view());
        assert!(overwatch.drain().is_empty());
    }

    #[test]
    fn emissions_preserve_fifo_order_and_epoch() {
        let mut overwatch = Overwatch::new(Box::new(Scripted {
            queue: vec![threat("first"), threat("second")],
        }));
        overwatch.arm(7);
        overwatch.observe_tick(1, &view());
        overwatch.observe_tick(2, &view());

        let drained = overwatch.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].threat.message, "first");
        assert_eq!(drained[1].threat.message, "second");
        assert!(drained.iter().all(|e| e.epoch == 7));
    }

    #[test]
    fn injection_uses_armed_epoch() {
        let mut overwatch = Overwatch::new(Box::new(Scripted { queue: vec![] }));
        overwatch.arm(3);
        overwatch.inject(threat("manual"));
        let drained = overwatch.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].epoch, 3);
    }

    #[test]
    fn injection_while_disarmed_is_dropped() {
        let overwatch = Overwatch::new(Box::new(Scripted { queue: vec![] }));
        overwatch.inject(threat("manual"));
        assert!(overwatch.drain().is_empty());
    }

    #[test]
    fn random_policy_is_reproducible() {
        let config = OverwatchConfig {
            base_probability: 1.0,
            ..OverwatchConfig::default()
        };
        let mut a = RandomThreatPolicy::new(config.clone());
        let mut b = RandomThreatPolicy::new(config);
        for tick in 0..10 {
            let ta = a.draw(tick, &view());
            let tb = b.draw(tick, &view());
            assert_eq!(ta, tb);
        }
    }
}
