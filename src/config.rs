//! Cleaning configuration.
//!
//! Loaded from YAML; every field has a default, so an empty file is valid:
//!
//! ```yaml
//! speed_threshold: 10.0        # m/s
//! radiation_time_window: 60    # seconds
//! threads: 8                   # batch workers, defaults to the CPU count
//! area:
//!   polygon:                   # [latitude, longitude] vertices
//!     - [39.9, 116.3]
//!     - [39.9, 116.4]
//!     - [40.0, 116.4]
//!     - [40.0, 116.3]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::area_extractor::AreaExtractor;
use crate::cleaning_pipeline::CleaningPipeline;
use crate::error::{Result, TrajectoryError};
use crate::radiation_filter::DEFAULT_RADIATION_WINDOW_SECS;
use crate::speed_filter::DEFAULT_SPEED_THRESHOLD;

/// Polygon bounding the area of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AreaConfig {
    pub polygon: Vec<[f64; 2]>,
}

impl AreaConfig {
    pub fn vertices(&self) -> Vec<(f64, f64)> {
        self.polygon.iter().map(|&[lat, lon]| (lat, lon)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleaningConfig {
    /// Maximum plausible speed in m/s, shared by both filters.
    pub speed_threshold: f64,
    /// Forward window of the radiation filter, in seconds.
    pub radiation_time_window: i64,
    pub area: Option<AreaConfig>,
    pub threads: Option<usize>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        CleaningConfig {
            speed_threshold: DEFAULT_SPEED_THRESHOLD,
            radiation_time_window: DEFAULT_RADIATION_WINDOW_SECS,
            area: None,
            threads: None,
        }
    }
}

impl CleaningConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path).map_err(|e| TrajectoryError::io(path, e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn with_speed_threshold(mut self, threshold: f64) -> Self {
        self.speed_threshold = threshold;
        self
    }

    pub fn with_radiation_time_window(mut self, secs: i64) -> Self {
        self.radiation_time_window = secs;
        self
    }

    pub fn with_area(mut self, polygon: Vec<[f64; 2]>) -> Self {
        self.area = Some(AreaConfig { polygon });
        self
    }

    /// Worker threads for batch runs.
    pub fn worker_threads(&self) -> usize {
        self.threads.filter(|&n| n > 0).unwrap_or_else(num_cpus::get)
    }

    pub fn pipeline(&self) -> Result<CleaningPipeline> {
        CleaningPipeline::with_threshold(self.speed_threshold, self.radiation_time_window)
    }

    /// Extractor for the configured polygon, `None` when no area is set.
    pub fn area_extractor(&self) -> Result<Option<AreaExtractor>> {
        self.area
            .as_ref()
            .map(|area| AreaExtractor::new(&area.vertices()))
            .transpose()
    }

    /// Extractor for commands that cannot run without a polygon.
    pub fn required_area_extractor(&self) -> Result<AreaExtractor> {
        self.area_extractor()?.ok_or(TrajectoryError::MissingPolygon)
    }

    /// Fail early on thresholds, windows or polygons the filters would reject.
    pub fn validate(&self) -> Result<()> {
        self.pipeline()?;
        self.area_extractor()?;
        Ok(())
    }
}
