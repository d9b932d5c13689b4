//! Error types for trajectory loading, cleaning and area extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the crate.
///
/// Zero time deltas, empty radiation windows and empty inputs are not errors;
/// the filters handle them as ordinary values.
#[derive(Debug, Error)]
pub enum TrajectoryError {
    /// Polygon cannot describe an area of interest.
    #[error("invalid polygon geometry: {0}")]
    InvalidGeometry(String),

    /// Speed thresholds must be strictly positive and finite.
    #[error("speed threshold must be a positive finite number of m/s, got {0}")]
    InvalidThreshold(f64),

    /// Radiation windows are whole seconds, at least one.
    #[error("radiation time window must be at least 1 second, got {0}")]
    InvalidTimeWindow(i64),

    /// An area filter was requested but no polygon is configured.
    #[error("no area polygon configured")]
    MissingPolygon,

    #[error("unsupported trajectory format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("GPX error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl TrajectoryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrajectoryError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TrajectoryError>;
