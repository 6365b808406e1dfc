//! Geometry helpers shared by the pathfinder and the Overwatch emitter.
//!
//! Distances use the haversine formula; proximity checks against threat zones
//! project onto a local tangent plane, which is accurate enough at mission
//! scale (tens of kilometres).

use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geographic coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance between two coordinates in kilometres.
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Linear interpolation between two coordinates.
pub fn lerp(a: LatLng, b: LatLng, t: f64) -> LatLng {
    LatLng {
        lat: a.lat + (b.lat - a.lat) * t,
        lng: a.lng + (b.lng - a.lng) * t,
    }
}

/// Projects `point` into kilometre offsets east/north of `origin`.
pub fn to_local_km(origin: LatLng, point: LatLng) -> (f64, f64) {
    let east = (point.lng - origin.lng).to_radians()
        * origin.lat.to_radians().cos()
        * EARTH_RADIUS_KM;
    let north = (point.lat - origin.lat).to_radians() * EARTH_RADIUS_KM;
    (east, north)
}

/// Inverse of [`to_local_km`]: coordinate at the given offsets from `origin`.
pub fn offset_km(origin: LatLng, east_km: f64, north_km: f64) -> LatLng {
    let lat = origin.lat + (north_km / EARTH_RADIUS_KM).to_degrees();
    let lng = origin.lng
        + (east_km / (EARTH_RADIUS_KM * origin.lat.to_radians().cos())).to_degrees();
    LatLng { lat, lng }
}

/// Shortest distance in kilometres from `point` to the segment `a`..`b`.
pub fn point_segment_km(point: LatLng, a: LatLng, b: LatLng) -> f64 {
    let (px, py) = to_local_km(a, point);
    let (bx, by) = to_local_km(a, b);
    let seg_len_sq = bx * bx + by * by;
    if seg_len_sq < f64::EPSILON {
        return haversine_km(point, a);
    }
    let t = ((px * bx + py * by) / seg_len_sq).clamp(0.0, 1.0);
    let dx = px - t * bx;
    let dy = py - t * by;
    (dx * dx + dy * dy).sqrt()
}

/// Closest point on the segment `a`..`b` to `point`.
pub fn nearest_point_on_segment(point: LatLng, a: LatLng, b: LatLng) -> LatLng {
    let (px, py) = to_local_km(a, point);
    let (bx, by) = to_local_km(a, b);
    let seg_len_sq = bx * bx + by * by;
    if seg_len_sq < f64::EPSILON {
        return a;
    }
    let t = ((px * bx + py * by) / seg_len_sq).clamp(0.0, 1.0);
    lerp(a, b, t)
}
