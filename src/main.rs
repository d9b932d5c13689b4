//! trajectory-cleaner CLI entry point.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trajectory_cleaner::batch_processor::{
    load_trajectory, run_batch, warn_on_heavy_removal, TrajectoryProcessor,
};
use trajectory_cleaner::config::CleaningConfig;
use trajectory_cleaner::export::{save_points_csv, save_points_gpx};
use trajectory_cleaner::trajectory_stats::{duration_s, speed_profile, total_distance_m};

/// Remove GPS noise from trajectories and cut them to an area of interest.
#[derive(Parser)]
#[command(name = "trajectory-cleaner")]
#[command(version)]
#[command(about = "Clean GPS trajectories with speed and radiation filters")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML cleaning configuration.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the speed threshold (m/s).
    #[arg(long, global = true)]
    speed_threshold: Option<f64>,

    /// Override the radiation time window (seconds).
    #[arg(long, global = true)]
    radiation_window: Option<i64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a single .plt or .gpx trajectory.
    Clean {
        input: PathBuf,

        /// Cleaned CSV output, defaults to `<stem>_cleaned.csv` next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the cleaned track as GPX.
        #[arg(long)]
        gpx: Option<PathBuf>,
    },

    /// Clean every trajectory under a directory.
    Batch {
        input_dir: PathBuf,

        #[arg(short, long)]
        output_dir: PathBuf,

        /// Write a GPX file next to each cleaned CSV.
        #[arg(long)]
        gpx: bool,
    },

    /// Describe the area polygon of a configuration file.
    Area { config_file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --log-level CLI arg > default "info"
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone());

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)))
        .init();

    match &cli.command {
        Commands::Clean { input, output, gpx } => {
            let config = load_config(&cli, cli.config.as_deref())?;
            clean_one(&config, input, output.as_deref(), gpx.as_deref())
        }
        Commands::Batch {
            input_dir,
            output_dir,
            gpx,
        } => {
            let config = load_config(&cli, cli.config.as_deref())?;
            let outcome = run_batch(input_dir, output_dir, &config, *gpx)?;

            println!("\n✅ Batch complete");
            println!("   Processed: {}", outcome.processed());
            println!("   Failed:    {}", outcome.failed());
            println!("   Summary:   {}", outcome.summary_path.display());
            Ok(())
        }
        Commands::Area { config_file } => describe_area(&load_config(&cli, Some(config_file.as_path()))?),
    }
}

/// Config file (if any) with command-line overrides applied, validated.
fn load_config(cli: &Cli, path: Option<&Path>) -> anyhow::Result<CleaningConfig> {
    let mut config = match path {
        Some(path) => CleaningConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CleaningConfig::default(),
    };

    if let Some(threshold) = cli.speed_threshold {
        config = config.with_speed_threshold(threshold);
    }
    if let Some(window) = cli.radiation_window {
        config = config.with_radiation_time_window(window);
    }

    config.validate()?;
    info!(
        "speed threshold {} m/s, radiation window {} s",
        config.speed_threshold, config.radiation_time_window
    );
    Ok(config)
}

fn clean_one(
    config: &CleaningConfig,
    input: &Path,
    output: Option<&Path>,
    gpx: Option<&Path>,
) -> anyhow::Result<()> {
    let processor = TrajectoryProcessor::from_config(config)?;
    let points = load_trajectory(input).with_context(|| format!("failed to load {}", input.display()))?;
    let processed = processor.process(&points);
    warn_on_heavy_removal(&input.display().to_string(), &processed.report);

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "trajectory".to_string());
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_file_name(format!("{}_cleaned.csv", stem)));

    save_points_csv(&processed.points, &output)?;
    if let Some(gpx) = gpx {
        save_points_gpx(&processed.points, &stem, gpx)?;
    }

    let report = processed.report;
    let before = speed_profile(&points);
    let after = speed_profile(&processed.points);

    println!("\n📍 {}", input.display());
    println!("   Input points:      {}", report.input_points);
    println!("   After speed:       {}", report.after_speed);
    println!("   After radiation:   {}", report.after_radiation);
    if let Some(inside) = processed.in_area {
        println!("   Inside area:       {}", inside);
    }
    println!("   Removed:           {} ({:.1}%)", report.removed(), report.removed_percent());
    println!(
        "   Distance:          {:.1} m -> {:.1} m over {:.0} s",
        total_distance_m(&points),
        total_distance_m(&processed.points),
        duration_s(&points)
    );
    println!("   Max speed:         {:.2} -> {:.2} m/s", before.max_mps, after.max_mps);
    println!("   Saved:             {}", output.display());
    Ok(())
}

fn describe_area(config: &CleaningConfig) -> anyhow::Result<()> {
    let area = config.required_area_extractor()?;

    let (lat, lon) = area.centroid();
    let (min_lat, min_lon, max_lat, max_lon) = area.bounding_box();

    println!("\n🗺️  Area of interest");
    println!("   Vertices:      {}", area.vertices().len() - 1);
    println!("   Centroid:      ({:.6}, {:.6})", lat, lon);
    println!("   Bounding box:  ({:.6}, {:.6}) - ({:.6}, {:.6})", min_lat, min_lon, max_lat, max_lon);
    println!("   Approx. area:  {:.0} m²", area.estimate_area());
    Ok(())
}
