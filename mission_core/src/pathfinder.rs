//! Route computation over the target catalog.
//!
//! The cost model is deliberately abstract: legs connect consecutive targets
//! in expedition order, and avoidance works by inserting detour waypoints
//! around hostile zones rather than searching a terrain graph. Ties never
//! arise because visit order is fixed by the expedition, which keeps routes
//! reproducible for tests.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Location, LocationCatalog, LocationId};
use crate::geo::{self, LatLng};
use crate::threat::ThreatZone;

/// Bail out instead of spiralling when zones overlap so densely that detour
/// insertion stops converging.
const MAX_DETOUR_PASSES: usize = 16;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("expedition requires at least two targets, got {0}")]
    InsufficientTargets(usize),
    #[error("unknown location id `{0}`")]
    UnknownLocation(LocationId),
    #[error("no route from `{from}` to `{to}` clears the active threat zones")]
    RouteUnreachable { from: LocationId, to: LocationId },
}

/// One point-to-point segment of a route between two consecutive targets.
#[derive(Debug, Clone, Serialize)]
pub struct Leg {
    pub from: LocationId,
    pub to: LocationId,
    /// Polyline actually flown, endpoints included. More than two entries
    /// means the leg detours around one or more threat zones.
    pub waypoints: Vec<LatLng>,
    pub distance_km: f64,
    pub travel_time_hours: f64,
    pub leg_risk: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub legs: Vec<Leg>,
    pub total_distance_km: f64,
    pub total_travel_hours: f64,
    /// Sum of leg risks; the risk model adds active threat modifiers on top.
    pub base_risk: f64,
}

impl Route {
    pub fn from_legs(legs: Vec<Leg>) -> Self {
        let total_distance_km = legs.iter().map(|l| l.distance_km).sum();
        let total_travel_hours = legs.iter().map(|l| l.travel_time_hours).sum();
        let base_risk = legs.iter().map(|l| l.leg_risk).sum();
        Self {
            legs,
            total_distance_km,
            total_travel_hours,
            base_risk,
        }
    }

    /// True when no flown segment comes closer to `zone.center` than its radius.
    pub fn clears_zone(&self, zone: &ThreatZone) -> bool {
        self.legs.iter().all(|leg| {
            leg.waypoints
                .windows(2)
                .all(|pair| geo::point_segment_km(zone.center, pair[0], pair[1]) >= zone.radius_km)
        })
    }
}

pub struct Pathfinder {
    catalog: Arc<LocationCatalog>,
    base_speed_kmh: f64,
    detour_margin: f64,
}

impl Pathfinder {
    pub fn new(catalog: Arc<LocationCatalog>, base_speed_kmh: f64, detour_margin: f64) -> Self {
        Self {
            catalog,
            base_speed_kmh,
            detour_margin,
        }
    }

    /// Builds the route visiting `ids` in order, detouring around every zone
    /// in `avoid`. Fails with [`RouteError::RouteUnreachable`] when a target
    /// sits inside a zone or no detour clears the constraints.
    pub fn compute_route(
        &self,
        ids: &[LocationId],
        avoid: &[ThreatZone],
    ) -> Result<Route, RouteError> {
        if ids.len() < 2 {
            return Err(RouteError::InsufficientTargets(ids.len()));
        }

        let targets: Vec<&Location> = ids
            .iter()
            .map(|id| {
                self.catalog
                    .get(id)
                    .ok_or_else(|| RouteError::UnknownLocation(id.clone()))
            })
            .collect::<Result<_, _>>()?;

        let legs: Vec<Leg> = targets
            .windows(2)
            .map(|pair| self.build_leg(pair[0], pair[1], avoid))
            .collect::<Result<_, _>>()?;

        let route = Route::from_legs(legs);
        debug!(
            legs = route.legs.len(),
            distance_km = route.total_distance_km,
            avoid_zones = avoid.len(),
            "route.computed"
        );
        Ok(route)
    }

    fn build_leg(
        &self,
        from: &Location,
        to: &Location,
        avoid: &[ThreatZone],
    ) -> Result<Leg, RouteError> {
        let unreachable = || RouteError::RouteUnreachable {
            from: from.id.clone(),
            to: to.id.clone(),
        };

        // A target inside a zone has no clear approach at all.
        for zone in avoid {
            if zone.contains(from.coords) || zone.contains(to.coords) {
                return Err(unreachable());
            }
        }

        let waypoints = self
            .plan_waypoints(from.coords, to.coords, avoid)
            .ok_or_else(unreachable)?;

        let distance_km: f64 = waypoints
            .windows(2)
            .map(|pair| geo::haversine_km(pair[0], pair[1]))
            .sum();
        let speed = self.base_speed_kmh * to.category.speed_modifier();
        let travel_time_hours = distance_km / speed;
        let leg_risk = from.base_risk + to.base_risk + to.category.terrain_factor();

        Ok(Leg {
            from: from.id.clone(),
            to: to.id.clone(),
            waypoints,
            distance_km,
            travel_time_hours,
            leg_risk,
        })
    }

    /// Repeatedly pushes the polyline away from intersecting zones. Detour
    /// candidates are tried on a fixed side order so the result is
    /// deterministic for a given avoid set.
    fn plan_waypoints(
        &self,
        start: LatLng,
        end: LatLng,
        avoid: &[ThreatZone],
    ) -> Option<Vec<LatLng>> {
        let mut path = vec![start, end];
        if avoid.is_empty() {
            return Some(path);
        }

        for _ in 0..MAX_DETOUR_PASSES {
            match self.first_intersection(&path, avoid) {
                None => return Some(path),
                Some((segment_idx, zone)) => {
                    let detour = self.detour_point(
                        path[segment_idx],
                        path[segment_idx + 1],
                        zone,
                        avoid,
                    )?;
                    path.insert(segment_idx + 1, detour);
                }
            }
        }
        None
    }

    fn first_intersection<'a>(
        &self,
        path: &[LatLng],
        avoid: &'a [ThreatZone],
    ) -> Option<(usize, &'a ThreatZone)> {
        for (idx, pair) in path.windows(2).enumerate() {
            for zone in avoid {
                if geo::point_segment_km(zone.center, pair[0], pair[1]) < zone.radius_km {
                    return Some((idx, zone));
                }
            }
        }
        None
    }

    /// Waypoint just outside `zone`, perpendicular to the blocked segment.
    /// The near side is tried first, then the far side; a candidate landing
    /// inside another zone is rejected.
    fn detour_point(
        &self,
        seg_start: LatLng,
        seg_end: LatLng,
        zone: &ThreatZone,
        avoid: &[ThreatZone],
    ) -> Option<LatLng> {
        let nearest = geo::nearest_point_on_segment(zone.center, seg_start, seg_end);
        let (mut dx, mut dy) = geo::to_local_km(zone.center, nearest);
        let len = (dx * dx + dy * dy).sqrt();
        if len < 1e-6 {
            // Segment passes through the center; fall back to the segment normal.
            let (sx, sy) = geo::to_local_km(seg_start, seg_end);
            let seg_len = (sx * sx + sy * sy).sqrt().max(1e-6);
            dx = -sy / seg_len;
            dy = sx / seg_len;
        } else {
            dx /= len;
            dy /= len;
        }

        let reach = zone.radius_km * self.detour_margin;
        for side in [1.0, -1.0] {
            let candidate = geo::offset_km(zone.center, dx * reach * side, dy * reach * side);
            if !avoid.iter().any(|z| z.contains(candidate)) {
                return Some(candidate);
            }
        }
        None
    }
}
