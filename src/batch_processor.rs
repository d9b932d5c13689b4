/// Batch cleaning of trajectory logs.
///
/// Walks an input directory for `.plt` and `.gpx` files, cleans each one
/// independently on a rayon pool, writes `<id>_cleaned.csv` (and optionally
/// `.gpx`) per trajectory plus a `cleaning_summary.csv` with one row per file.
/// A file that fails to load or write becomes an `ERROR` row; the batch goes on.

use std::path::{Path, PathBuf};
use std::time::Instant;

use csv::Writer;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::area_extractor::AreaExtractor;
use crate::cleaning_pipeline::{CleaningPipeline, CleaningReport};
use crate::config::CleaningConfig;
use crate::error::{Result, TrajectoryError};
use crate::export::{save_points_csv, save_points_gpx};
use crate::gpx_reader::load_gpx_file;
use crate::plt_reader::{has_extension, load_plt_file};
use crate::point_filter::PointFilter;
use crate::trajectory::TrajectoryPoint;
use crate::trajectory_stats::{speed_profile, total_distance_m, SpeedProfile};

pub const SUMMARY_FILENAME: &str = "cleaning_summary.csv";

/// Load a trajectory, choosing the reader by file extension.
pub fn load_trajectory(path: &Path) -> Result<Vec<TrajectoryPoint>> {
    if has_extension(path, "plt") {
        load_plt_file(path)
    } else if has_extension(path, "gpx") {
        load_gpx_file(path)
    } else {
        Err(TrajectoryError::UnsupportedFormat(path.to_path_buf()))
    }
}

/// Cleaning pipeline plus optional area filter, applied to whole trajectories.
#[derive(Debug, Clone)]
pub struct TrajectoryProcessor {
    pipeline: CleaningPipeline,
    area: Option<AreaExtractor>,
}

/// Result of running one trajectory through a `TrajectoryProcessor`.
#[derive(Debug, Clone)]
pub struct ProcessedTrajectory {
    pub points: Vec<TrajectoryPoint>,
    pub report: CleaningReport,
    /// Points left after the area filter, when one is configured.
    pub in_area: Option<usize>,
}

impl TrajectoryProcessor {
    pub fn new(pipeline: CleaningPipeline, area: Option<AreaExtractor>) -> Self {
        TrajectoryProcessor { pipeline, area }
    }

    pub fn from_config(config: &CleaningConfig) -> Result<Self> {
        Ok(TrajectoryProcessor {
            pipeline: config.pipeline()?,
            area: config.area_extractor()?,
        })
    }

    pub fn area(&self) -> Option<&AreaExtractor> {
        self.area.as_ref()
    }

    pub fn process(&self, points: &[TrajectoryPoint]) -> ProcessedTrajectory {
        let (cleaned, report) = self.pipeline.clean_with_report(points);

        match &self.area {
            Some(area) => {
                let inside = area.apply(&cleaned);
                ProcessedTrajectory {
                    in_area: Some(inside.len()),
                    points: inside,
                    report,
                }
            }
            None => ProcessedTrajectory {
                points: cleaned,
                report,
                in_area: None,
            },
        }
    }
}

/// One row of `cleaning_summary.csv`.
#[derive(Debug, Clone, Serialize)]
pub struct TrajectorySummary {
    pub trajectory_id: String,
    pub source_file: String,
    pub input_points: usize,
    pub after_speed: usize,
    pub after_radiation: usize,
    pub in_area: Option<usize>,
    pub removed_percent: f64,
    pub distance_before_m: f64,
    pub distance_after_m: f64,
    pub max_speed_before_mps: f64,
    pub max_speed_after_mps: f64,
    pub mean_speed_before_mps: f64,
    pub mean_speed_after_mps: f64,
    pub instantaneous_jumps_before: usize,
    pub output_file: String,
    pub status: String,
}

impl TrajectorySummary {
    fn failed(trajectory_id: String, source: &Path, error: &TrajectoryError) -> Self {
        TrajectorySummary {
            trajectory_id,
            source_file: source.display().to_string(),
            input_points: 0,
            after_speed: 0,
            after_radiation: 0,
            in_area: None,
            removed_percent: 0.0,
            distance_before_m: 0.0,
            distance_after_m: 0.0,
            max_speed_before_mps: 0.0,
            max_speed_after_mps: 0.0,
            mean_speed_before_mps: 0.0,
            mean_speed_after_mps: 0.0,
            instantaneous_jumps_before: 0,
            output_file: String::new(),
            status: format!("ERROR: {}", error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "SUCCESS"
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub summaries: Vec<TrajectorySummary>,
    pub summary_path: PathBuf,
}

impl BatchOutcome {
    pub fn processed(&self) -> usize {
        self.summaries.iter().filter(|s| s.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.summaries.len() - self.processed()
    }
}

/// Every `.plt`/`.gpx` file under `input_dir`, sorted.
pub fn collect_trajectory_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(input_dir) {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_file() && (has_extension(path, "plt") || has_extension(path, "gpx")) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Identifier unique within the input tree: relative path without extension,
/// separators replaced by `_`.
pub fn trajectory_id(input_dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(input_dir).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("_")
}

fn process_file(
    processor: &TrajectoryProcessor,
    path: &Path,
    id: &str,
    output_dir: &Path,
    write_gpx: bool,
) -> Result<TrajectorySummary> {
    let points = load_trajectory(path)?;
    let processed = processor.process(&points);

    let csv_name = format!("{}_cleaned.csv", id);
    save_points_csv(&processed.points, &output_dir.join(&csv_name))?;
    if write_gpx {
        save_points_gpx(&processed.points, id, &output_dir.join(format!("{}_cleaned.gpx", id)))?;
    }

    let before: SpeedProfile = speed_profile(&points);
    let after = speed_profile(&processed.points);

    debug!(
        "{}: {} -> {} (speed) -> {} (radiation) points",
        id, processed.report.input_points, processed.report.after_speed, processed.report.after_radiation
    );
    warn_on_heavy_removal(id, &processed.report);

    Ok(TrajectorySummary {
        trajectory_id: id.to_string(),
        source_file: path.display().to_string(),
        input_points: processed.report.input_points,
        after_speed: processed.report.after_speed,
        after_radiation: processed.report.after_radiation,
        in_area: processed.in_area,
        removed_percent: processed.report.removed_percent(),
        distance_before_m: total_distance_m(&points),
        distance_after_m: total_distance_m(&processed.points),
        max_speed_before_mps: before.max_mps,
        max_speed_after_mps: after.max_mps,
        mean_speed_before_mps: before.mean_mps,
        mean_speed_after_mps: after.mean_mps,
        instantaneous_jumps_before: before.instantaneous_jumps,
        output_file: csv_name,
        status: "SUCCESS".to_string(),
    })
}

/// Flag trajectories the filters emptied or cut by more than half.
pub fn warn_on_heavy_removal(id: &str, report: &CleaningReport) {
    if report.removed_all() {
        warn!("{}: all {} points were removed by cleaning", id, report.input_points);
    } else if report.removed_majority() {
        warn!(
            "{}: cleaning removed {:.1}% of {} points",
            id,
            report.removed_percent(),
            report.input_points
        );
    }
}

pub fn write_summary_csv(summaries: &[TrajectorySummary], path: &Path) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    for summary in summaries {
        wtr.serialize(summary)?;
    }
    wtr.flush().map_err(|e| TrajectoryError::io(path, e))?;
    Ok(())
}

/// Clean every trajectory under `input_dir` into `output_dir`.
pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    config: &CleaningConfig,
    write_gpx: bool,
) -> Result<BatchOutcome> {
    let started = Instant::now();
    let processor = TrajectoryProcessor::from_config(config)?;

    std::fs::create_dir_all(output_dir).map_err(|e| TrajectoryError::io(output_dir, e))?;

    let files = collect_trajectory_files(input_dir)?;
    let threads = config.worker_threads();
    info!(
        "found {} trajectory files in {}, cleaning on {} threads",
        files.len(),
        input_dir.display(),
        threads
    );

    let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;
    let summaries: Vec<TrajectorySummary> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let id = trajectory_id(input_dir, path);
                match process_file(&processor, path, &id, output_dir, write_gpx) {
                    Ok(summary) => summary,
                    Err(e) => {
                        warn!("failed to clean {}: {}", path.display(), e);
                        TrajectorySummary::failed(id, path, &e)
                    }
                }
            })
            .collect()
    });

    let summary_path = output_dir.join(SUMMARY_FILENAME);
    write_summary_csv(&summaries, &summary_path)?;

    let outcome = BatchOutcome {
        summaries,
        summary_path,
    };
    info!(
        "cleaned {} trajectories ({} failed) in {:.2}s, summary at {}",
        outcome.processed(),
        outcome.failed(),
        started.elapsed().as_secs_f64(),
        outcome.summary_path.display()
    );

    Ok(outcome)
}
