/// Speed-based outlier rejection.
///
/// Each point is judged by its speed to its *original* successor. The pass is
/// single and index-aligned: speeds are not recomputed after removals, and
/// the last point (no successor) always passes with speed 0.

use crate::error::{Result, TrajectoryError};
use crate::geo_math::speed;
use crate::point_filter::PointFilter;
use crate::trajectory::TrajectoryPoint;

/// Roughly a human sprint, in m/s.
pub const DEFAULT_SPEED_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedFilter {
    threshold_mps: f64,
}

impl SpeedFilter {
    pub fn new(threshold_mps: f64) -> Result<Self> {
        if !(threshold_mps.is_finite() && threshold_mps > 0.0) {
            return Err(TrajectoryError::InvalidThreshold(threshold_mps));
        }
        Ok(SpeedFilter { threshold_mps })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_mps
    }

    /// Speed assigned to each point: pair (i, i+1) for all but the last, 0 for the last.
    pub fn assigned_speeds(points: &[TrajectoryPoint]) -> Vec<f64> {
        if points.is_empty() {
            return Vec::new();
        }

        let mut speeds: Vec<f64> = points.windows(2).map(|w| speed(&w[0], &w[1])).collect();
        speeds.push(0.0);
        speeds
    }
}

impl Default for SpeedFilter {
    fn default() -> Self {
        SpeedFilter {
            threshold_mps: DEFAULT_SPEED_THRESHOLD,
        }
    }
}

impl PointFilter for SpeedFilter {
    fn name(&self) -> &'static str {
        "speed"
    }

    fn keep_mask(&self, points: &[TrajectoryPoint]) -> Vec<bool> {
        Self::assigned_speeds(points)
            .into_iter()
            .map(|s| s <= self.threshold_mps)
            .collect()
    }
}
