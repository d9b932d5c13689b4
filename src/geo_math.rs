/// Geodesic primitives: haversine distance, pairwise speed and radiation.
///
/// All functions are pure. Coordinates are decimal degrees and are not
/// validated here.

use crate::trajectory::{Position, TrajectoryPoint};

/// Mean Earth radius used by every distance in the crate.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two lat/lon pairs.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance in meters between two positions.
pub fn distance<A: Position, B: Position>(p1: &A, p2: &B) -> f64 {
    let (lat1, lon1) = p1.lat_lon();
    let (lat2, lon2) = p2.lat_lon();
    haversine_distance(lat1, lon1, lat2, lon2)
}

/// Seconds elapsed from `p1` to `p2`, nanosecond resolution.
///
/// Only identical timestamps give exactly zero.
pub fn elapsed_seconds(p1: &TrajectoryPoint, p2: &TrajectoryPoint) -> f64 {
    let delta = p2.timestamp() - p1.timestamp();
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        // beyond ~292 years nanoseconds overflow i64
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}

/// Speed in m/s from `p1` to `p2`.
///
/// A zero time delta yields `f64::INFINITY`, which fails every finite
/// threshold. `p2` must not be earlier than `p1`.
pub fn speed(p1: &TrajectoryPoint, p2: &TrajectoryPoint) -> f64 {
    let dt = elapsed_seconds(p1, p2);
    debug_assert!(dt >= 0.0, "speed() requires temporally ordered points");

    if dt == 0.0 {
        return f64::INFINITY;
    }

    distance(p1, p2) / dt
}

/// Maximum distance in meters from `center` to any of `points`; 0.0 when empty.
pub fn radiation<I, C>(points: I, center: &C) -> f64
where
    I: IntoIterator,
    I::Item: Position,
    C: Position,
{
    points
        .into_iter()
        .map(|p| distance(center, &p))
        .fold(0.0, f64::max)
}
