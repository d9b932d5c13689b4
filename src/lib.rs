//! GPS trajectory cleaning.
//!
//! Two filters remove physically implausible fixes from time-ordered
//! trajectories: a speed filter on adjacent pairs and a radiation filter that
//! bounds how far the track wanders inside a forward time window. A polygon
//! area extractor keeps the points inside a region of interest. Readers cover
//! GeoLife `.plt` logs and GPX tracks; the batch processor cleans whole
//! directories in parallel.

pub mod area_extractor;
pub mod batch_processor;
pub mod cleaning_pipeline;
pub mod config;
pub mod error;
pub mod export;
pub mod geo_math;
pub mod gpx_reader;
pub mod plt_reader;
pub mod point_filter;
pub mod radiation_filter;
pub mod speed_filter;
pub mod trajectory;
pub mod trajectory_stats;

pub use area_extractor::AreaExtractor;
pub use batch_processor::{load_trajectory, run_batch, BatchOutcome, TrajectoryProcessor, TrajectorySummary};
pub use cleaning_pipeline::{CleaningPipeline, CleaningReport};
pub use config::CleaningConfig;
pub use error::{Result, TrajectoryError};
pub use point_filter::PointFilter;
pub use radiation_filter::RadiationFilter;
pub use speed_filter::SpeedFilter;
pub use trajectory::{Position, TrajectoryPoint};
