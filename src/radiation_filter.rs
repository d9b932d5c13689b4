/// Radiation (local spread) outlier rejection.
///
/// For every point the filter looks forward over `(t, t + window]`, takes the
/// farthest of those points from it and divides by the window length. Points
/// whose implied speed exceeds the threshold are dropped; points with an
/// empty forward window always stay.
///
/// Windows are located by binary search on the sorted timestamps, so each
/// point costs O(log n + k) instead of a rescan of the whole trajectory.

use chrono::Duration;
use rayon::prelude::*;

use crate::error::{Result, TrajectoryError};
use crate::geo_math::radiation;
use crate::point_filter::PointFilter;
use crate::speed_filter::DEFAULT_SPEED_THRESHOLD;
use crate::trajectory::TrajectoryPoint;

pub const DEFAULT_RADIATION_WINDOW_SECS: i64 = 60;

// Below this many points the rayon fan-out costs more than it saves.
const PARALLEL_MIN_POINTS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiationFilter {
    threshold_mps: f64,
    window_secs: i64,
}

impl RadiationFilter {
    pub fn new(threshold_mps: f64, window_secs: i64) -> Result<Self> {
        if !(threshold_mps.is_finite() && threshold_mps > 0.0) {
            return Err(TrajectoryError::InvalidThreshold(threshold_mps));
        }
        if window_secs < 1 {
            return Err(TrajectoryError::InvalidTimeWindow(window_secs));
        }
        Ok(RadiationFilter {
            threshold_mps,
            window_secs,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_mps
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    /// Index range of the forward window `(t_i, t_i + W]` for point `i`.
    pub fn window_range(&self, points: &[TrajectoryPoint], i: usize) -> std::ops::Range<usize> {
        let t = points[i].timestamp();
        let window_end = t + Duration::seconds(self.window_secs);

        let start = points.partition_point(|p| p.timestamp() <= t);
        let end = points.partition_point(|p| p.timestamp() <= window_end);
        start..end.max(start)
    }

    /// Implied speed for point `i`, or `None` when its forward window is empty.
    pub fn implied_speed(&self, points: &[TrajectoryPoint], i: usize) -> Option<f64> {
        let window = &points[self.window_range(points, i)];
        if window.is_empty() {
            return None;
        }

        Some(radiation(window, &points[i]) / self.window_secs as f64)
    }

    fn keeps(&self, points: &[TrajectoryPoint], i: usize) -> bool {
        match self.implied_speed(points, i) {
            Some(implied) => implied <= self.threshold_mps,
            None => true,
        }
    }
}

impl Default for RadiationFilter {
    fn default() -> Self {
        RadiationFilter {
            threshold_mps: DEFAULT_SPEED_THRESHOLD,
            window_secs: DEFAULT_RADIATION_WINDOW_SECS,
        }
    }
}

impl PointFilter for RadiationFilter {
    fn name(&self) -> &'static str {
        "radiation"
    }

    fn keep_mask(&self, points: &[TrajectoryPoint]) -> Vec<bool> {
        if points.len() >= PARALLEL_MIN_POINTS {
            (0..points.len())
                .into_par_iter()
                .map(|i| self.keeps(points, i))
                .collect()
        } else {
            (0..points.len()).map(|i| self.keeps(points, i)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_math::distance;
    use chrono::{NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2009, 4, 2).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    fn pt(lat: f64, lon: f64, secs: i64) -> TrajectoryPoint {
        TrajectoryPoint::at(lat, lon, None, t0() + Duration::seconds(secs))
    }

    fn walk(n: usize, step_secs: i64) -> Vec<TrajectoryPoint> {
        (0..n)
            .map(|i| pt(39.9, 116.3 + i as f64 * 0.00001, i as i64 * step_secs))
            .collect()
    }

    #[test]
    fn test_constructor_validation() {
        assert!(RadiationFilter::new(10.0, 0).is_err());
        assert!(RadiationFilter::new(0.0, 60).is_err());
        let f = RadiationFilter::default();
        assert_eq!((f.threshold(), f.window_secs()), (10.0, 60));
    }

    #[test]
    fn test_window_is_open_closed() {
        // Points at 0, 30, 60, 61 s: window of the first is (0, 60].
        let points = vec![pt(0.0, 0.0, 0), pt(0.0, 0.0, 30), pt(0.0, 0.0, 60), pt(0.0, 0.0, 61)];
        let f = RadiationFilter::default();

        assert_eq!(f.window_range(&points, 0), 1..3);
        assert_eq!(f.window_range(&points, 2), 3..4);
        assert!(f.window_range(&points, 3).is_empty());
    }

    #[test]
    fn test_equal_timestamps_are_outside_the_window() {
        let points = vec![pt(0.0, 0.0, 0), pt(0.5, 0.0, 0), pt(0.0, 0.0, 10)];
        let f = RadiationFilter::default();
        assert_eq!(f.window_range(&points, 0), 2..3);
        assert_eq!(f.window_range(&points, 1), 2..3);
    }

    #[test]
    fn test_empty_window_keeps_point() {
        let points = vec![pt(0.0, 0.0, 0), pt(5.0, 5.0, 3600)];
        let f = RadiationFilter::default();
        assert_eq!(f.implied_speed(&points, 0), None);
        assert_eq!(f.keep_mask(&points), vec![true, true]);
    }

    #[test]
    fn test_snap_away_and_back_is_rejected() {
        // Dense sampling, one fix snaps ~1.1 km north and right back.
        let mut points = walk(30, 2);
        points[10] = pt(39.91, points[10].longitude(), 20);

        let mask = RadiationFilter::default().keep_mask(&points);
        assert!(!mask[10]);
        // Fixes whose next minute contains the spike are dropped as well.
        assert!(!mask[0]);
        assert!(mask[11]);
    }

    #[test]
    fn test_kept_points_satisfy_bound() {
        let mut points = walk(40, 3);
        points[7] = pt(39.95, points[7].longitude(), 21);
        points[25] = pt(39.85, points[25].longitude(), 75);

        let f = RadiationFilter::default();
        let mask = f.keep_mask(&points);
        for (i, &keep) in mask.iter().enumerate() {
            let window = &points[f.window_range(&points, i)];
            let bound_holds = window.is_empty()
                || window.iter().map(|p| distance(&points[i], p)).fold(0.0, f64::max)
                    / f.window_secs() as f64
                    <= f.threshold();
            assert_eq!(keep, bound_holds, "point {i}");
        }
    }

    #[test]
    fn test_parallel_path_matches_sequential() {
        let mut points = walk(PARALLEL_MIN_POINTS + 10, 1);
        for i in (100..points.len()).step_by(500) {
            points[i] = pt(40.0, points[i].longitude(), i as i64);
        }

        let f = RadiationFilter::default();
        let parallel = f.keep_mask(&points);
        let sequential: Vec<bool> = (0..points.len()).map(|i| f.keeps(&points, i)).collect();
        assert_eq!(parallel, sequential);
        assert!(parallel.iter().any(|k| !k));
    }

    #[test]
    fn test_empty_input() {
        assert!(RadiationFilter::default().apply(&[]).is_empty());
    }
}
