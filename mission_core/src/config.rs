use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Global tunables for the mission engine.
///
/// Defaults reproduce the field-calibrated values: fifteen simulated minutes
/// per tick, 50 km/h cruise speed on mixed terrain, and 1.5 hours of
/// boots-on-ground overhead per intermediate stop.
#[derive(Debug, Clone)]
pub struct MissionConfig {
    /// Simulated minutes that one scheduler tick advances the mission clock.
    pub tick_minutes: f64,
    /// Cruise speed on neutral terrain, km/h. Terrain modifiers scale it down.
    pub base_speed_kmh: f64,
    /// Boots-on-ground overhead per intermediate stop, hours.
    pub stop_overhead_hours: f64,
    /// Ticks a threat stays active before it expires out of the risk picture.
    pub threat_ttl_ticks: u64,
    /// Detour waypoints are placed at `radius * detour_margin` from a zone center.
    pub detour_margin: f64,
    pub supplies_drain_per_hour: f64,
    pub fatigue_gain_per_hour: f64,
    pub integrity_drain_per_hour: f64,
    pub overwatch: OverwatchConfig,
    pub telemetry_bind: SocketAddr,
    pub command_bind: SocketAddr,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            tick_minutes: 15.0,
            base_speed_kmh: 50.0,
            stop_overhead_hours: 1.5,
            threat_ttl_ticks: 12,
            detour_margin: 1.25,
            supplies_drain_per_hour: 2.0,
            fatigue_gain_per_hour: 1.5,
            integrity_drain_per_hour: 0.5,
            overwatch: OverwatchConfig::default(),
            telemetry_bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 41500),
            command_bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 41501),
        }
    }
}

impl MissionConfig {
    pub fn tick_hours(&self) -> f64 {
        self.tick_minutes / 60.0
    }
}

/// Parameters of the default stochastic threat policy.
///
/// The per-tick emission probability is
/// `base_probability + current_risk * risk_weight`, so hot routes draw more
/// attention. Seeded so runs replay identically.
#[derive(Debug, Clone)]
pub struct OverwatchConfig {
    pub seed: u64,
    pub base_probability: f64,
    pub risk_weight: f64,
    /// Inclusive range for the impact radius of a surfaced threat, km.
    pub radius_km: (f64, f64),
    /// Inclusive range for the risk score a threat adds while active.
    pub risk_modifier: (f64, f64),
    /// How far off the current leg a threat may materialize, km.
    pub placement_jitter_km: f64,
    /// Chance that a critical on-route threat demands an abort instead of a reroute.
    pub abort_weight: f64,
}

impl Default for OverwatchConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED_0B5E,
            base_probability: 0.01,
            risk_weight: 0.001,
            radius_km: (5.0, 20.0),
            risk_modifier: (20.0, 70.0),
            placement_jitter_km: 12.0,
            abort_weight: 0.2,
        }
    }
}
