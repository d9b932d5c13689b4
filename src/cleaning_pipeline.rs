/// Canonical cleaning sequence: speed filter, then radiation filter.
///
/// The radiation filter runs on the speed filter's output, so its windows
/// only ever see points that survived the first pass. Each filter runs once.

use serde::Serialize;

use crate::error::Result;
use crate::point_filter::PointFilter;
use crate::radiation_filter::RadiationFilter;
use crate::speed_filter::SpeedFilter;
use crate::trajectory::{is_time_ordered, TrajectoryPoint};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CleaningPipeline {
    speed: SpeedFilter,
    radiation: RadiationFilter,
}

/// Point counts after each stage of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_points: usize,
    pub after_speed: usize,
    pub after_radiation: usize,
}

impl CleaningReport {
    pub fn removed(&self) -> usize {
        self.input_points - self.after_radiation
    }

    pub fn removed_percent(&self) -> f64 {
        if self.input_points == 0 {
            0.0
        } else {
            self.removed() as f64 / self.input_points as f64 * 100.0
        }
    }

    /// A non-empty input came out empty.
    pub fn removed_all(&self) -> bool {
        self.input_points > 0 && self.after_radiation == 0
    }

    pub fn removed_majority(&self) -> bool {
        self.removed_percent() > 50.0
    }
}

impl CleaningPipeline {
    pub fn new(speed: SpeedFilter, radiation: RadiationFilter) -> Self {
        CleaningPipeline { speed, radiation }
    }

    /// Pipeline where both filters share one speed threshold, as the log cleaner always did.
    pub fn with_threshold(speed_threshold: f64, radiation_window_secs: i64) -> Result<Self> {
        Ok(CleaningPipeline {
            speed: SpeedFilter::new(speed_threshold)?,
            radiation: RadiationFilter::new(speed_threshold, radiation_window_secs)?,
        })
    }

    pub fn speed_filter(&self) -> &SpeedFilter {
        &self.speed
    }

    pub fn radiation_filter(&self) -> &RadiationFilter {
        &self.radiation
    }

    pub fn clean(&self, points: &[TrajectoryPoint]) -> Vec<TrajectoryPoint> {
        self.clean_with_report(points).0
    }

    pub fn clean_with_report(&self, points: &[TrajectoryPoint]) -> (Vec<TrajectoryPoint>, CleaningReport) {
        debug_assert!(is_time_ordered(points), "trajectory must be sorted by timestamp");

        let after_speed = self.speed.apply(points);
        let cleaned = self.radiation.apply(&after_speed);

        let report = CleaningReport {
            input_points: points.len(),
            after_speed: after_speed.len(),
            after_radiation: cleaned.len(),
        };

        (cleaned, report)
    }
}
