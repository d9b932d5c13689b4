use std::fs;
use std::path::Path;

use trajectory_cleaner::batch_processor::{run_batch, SUMMARY_FILENAME};
use trajectory_cleaner::config::CleaningConfig;
use trajectory_cleaner::export::save_points_csv;
use trajectory_cleaner::plt_reader::{load_plt_directory, load_plt_file};
use trajectory_cleaner::{load_trajectory, CleaningPipeline};

const PLT_HEADER: &str = "Geolife trajectory\nWGS 84\nAltitude is in Feet\nReserved 3\n0,2,255,My Track,0,0,2,8421376\n0\n";

/// A slow walk north with one fix teleported ~1 km east at the given index.
fn walk_with_spike(spike_at: usize) -> String {
    let mut plt = PLT_HEADER.to_string();
    for i in 0..30 {
        let lat = 39.9 + i as f64 * 0.00001;
        let lon = if i == spike_at { 116.41 } else { 116.4 };
        let secs = i * 5;
        plt.push_str(&format!(
            "{:.6},{:.6},0,492,39744.12,2008-10-23,03:{:02}:{:02}\n",
            lat,
            lon,
            secs / 60,
            secs % 60
        ));
    }
    plt
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn plt_file_from_disk_is_cleaned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("20081023025304.plt");
    write(&path, &walk_with_spike(12));

    let points = load_plt_file(&path).unwrap();
    assert_eq!(points.len(), 30);
    assert_eq!(points[0].source_date(), "2008-10-23");
    assert_eq!(points[0].altitude(), Some(492.0));

    let (cleaned, report) = CleaningPipeline::default().clean_with_report(&points);
    assert_eq!(report.input_points, 30);
    assert!(cleaned.iter().all(|p| p.longitude() < 116.405));
    assert!(report.removed() >= 1);
}

#[test]
fn plt_directory_is_keyed_by_stem() {
    let dir = tempfile::tempdir().unwrap();
    write(&dir.path().join("a.plt"), &walk_with_spike(3));
    write(&dir.path().join("b.plt"), &walk_with_spike(20));
    write(&dir.path().join("notes.txt"), "not a trajectory");

    let loaded = load_plt_directory(dir.path()).unwrap();
    assert_eq!(loaded.keys().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn batch_run_writes_outputs_and_error_rows() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    write(&input.path().join("000/Trajectory/first.plt"), &walk_with_spike(10));
    write(&input.path().join("001/Trajectory/second.plt"), &walk_with_spike(25));
    write(&input.path().join("broken.gpx"), "<gpx><trk>");

    let config = CleaningConfig {
        threads: Some(2),
        ..Default::default()
    };
    let outcome = run_batch(input.path(), output.path(), &config, true).unwrap();

    assert_eq!(outcome.summaries.len(), 3);
    assert_eq!(outcome.processed(), 2);
    assert_eq!(outcome.failed(), 1);

    for id in ["000_Trajectory_first", "001_Trajectory_second"] {
        assert!(output.path().join(format!("{}_cleaned.csv", id)).exists());
        let gpx = output.path().join(format!("{}_cleaned.gpx", id));
        let reloaded = load_trajectory(&gpx).unwrap();
        assert!(!reloaded.is_empty());
    }

    let summary = fs::read_to_string(output.path().join(SUMMARY_FILENAME)).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("trajectory_id,source_file,input_points"));
    assert!(summary.contains("ERROR: GPX error"));
}

#[test]
fn config_file_drives_area_filtering() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("cleaning.yaml");
    write(
        &config_path,
        "speed_threshold: 10.0\nradiation_time_window: 60\narea:\n  polygon:\n    - [39.8, 116.3]\n    - [39.8, 116.405]\n    - [40.0, 116.405]\n    - [40.0, 116.3]\n",
    );

    let config = CleaningConfig::load(&config_path).unwrap();
    let area = config.area_extractor().unwrap().unwrap();
    assert!(area.contains(39.9, 116.4));
    assert!(!area.contains(39.9, 116.41));

    let plt = dir.path().join("walk.plt");
    write(&plt, &walk_with_spike(5));
    let points = load_trajectory(&plt).unwrap();
    let inside = area.filter(&points);
    assert_eq!(inside.len(), 29);
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CleaningConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(err.to_string().contains("absent.yaml"));
}

#[test]
fn exported_csv_has_one_row_per_point() {
    let dir = tempfile::tempdir().unwrap();
    let plt = dir.path().join("walk.plt");
    write(&plt, &walk_with_spike(29));

    let points = load_plt_file(&plt).unwrap();
    let csv_path = dir.path().join("walk_cleaned.csv");
    save_points_csv(&points, &csv_path).unwrap();

    let text = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(text.lines().count(), points.len() + 1);
    assert!(text.lines().nth(1).unwrap().ends_with("2008-10-23,03:00:00"));
}
