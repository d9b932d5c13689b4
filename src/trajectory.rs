/// Trajectory point model shared by every filter.
///
/// A trajectory is a plain `Vec<TrajectoryPoint>` sorted ascending by
/// timestamp. Filters only select subsets of it; they never reorder, insert
/// or modify points.

use chrono::NaiveDateTime;
use serde::Serialize;

/// A single GPS fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
    timestamp: NaiveDateTime,
    source_date: String,
    source_time: String,
}

impl TrajectoryPoint {
    pub fn new(
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
        timestamp: NaiveDateTime,
        source_date: impl Into<String>,
        source_time: impl Into<String>,
    ) -> Self {
        TrajectoryPoint {
            latitude,
            longitude,
            altitude,
            timestamp,
            source_date: source_date.into(),
            source_time: source_time.into(),
        }
    }

    /// Build a point whose source date/time strings are derived from the timestamp.
    pub fn at(latitude: f64, longitude: f64, altitude: Option<f64>, timestamp: NaiveDateTime) -> Self {
        let source_date = timestamp.format("%Y-%m-%d").to_string();
        let source_time = timestamp.format("%H:%M:%S").to_string();
        Self::new(latitude, longitude, altitude, timestamp, source_date, source_time)
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Altitude as recorded, `None` when the log marked it unknown.
    pub fn altitude(&self) -> Option<f64> {
        self.altitude
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn source_date(&self) -> &str {
        &self.source_date
    }

    pub fn source_time(&self) -> &str {
        &self.source_time
    }
}

/// Anything with a latitude/longitude in decimal degrees.
pub trait Position {
    fn lat_lon(&self) -> (f64, f64);
}

impl Position for TrajectoryPoint {
    fn lat_lon(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl Position for (f64, f64) {
    fn lat_lon(&self) -> (f64, f64) {
        *self
    }
}

impl<P: Position + ?Sized> Position for &P {
    fn lat_lon(&self) -> (f64, f64) {
        (**self).lat_lon()
    }
}

/// True when timestamps never decrease along the sequence.
pub fn is_time_ordered(points: &[TrajectoryPoint]) -> bool {
    points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
}

/// Stable sort by timestamp, keeping the log order of equal timestamps.
pub fn sort_by_timestamp(points: &mut [TrajectoryPoint]) {
    points.sort_by_key(|p| p.timestamp);
}
