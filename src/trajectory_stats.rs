/// Descriptive statistics over a trajectory, used to report what cleaning did.

use serde::Serialize;

use crate::geo_math::{distance, elapsed_seconds, speed};
use crate::trajectory::TrajectoryPoint;

/// Adjacent-pair speed summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SpeedProfile {
    pub pairs: usize,
    pub max_mps: f64,
    pub mean_mps: f64,
    /// Pairs sharing a timestamp (infinite speed); excluded from max/mean.
    pub instantaneous_jumps: usize,
}

pub fn speed_profile(points: &[TrajectoryPoint]) -> SpeedProfile {
    let mut finite = Vec::with_capacity(points.len().saturating_sub(1));
    let mut instantaneous_jumps = 0;

    for w in points.windows(2) {
        let s = speed(&w[0], &w[1]);
        if s.is_finite() {
            finite.push(s);
        } else {
            instantaneous_jumps += 1;
        }
    }

    let max_mps = finite.iter().copied().fold(0.0, f64::max);
    let mean_mps = if finite.is_empty() {
        0.0
    } else {
        finite.iter().sum::<f64>() / finite.len() as f64
    };

    SpeedProfile {
        pairs: points.len().saturating_sub(1),
        max_mps,
        mean_mps,
        instantaneous_jumps,
    }
}

/// Sum of haversine distances between consecutive points.
pub fn total_distance_m(points: &[TrajectoryPoint]) -> f64 {
    points.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// Seconds between the first and last point.
pub fn duration_s(points: &[TrajectoryPoint]) -> f64 {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => elapsed_seconds(first, last),
        _ => 0.0,
    }
}
