/// Writers for cleaned trajectories: CSV rows and a single-track GPX file.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;
use geo::point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use serde::Serialize;
use time::OffsetDateTime;

use crate::error::{Result, TrajectoryError};
use crate::trajectory::TrajectoryPoint;

#[derive(Debug, Serialize)]
struct PointRow<'a> {
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
    timestamp: String,
    date: &'a str,
    time: &'a str,
}

impl<'a> From<&'a TrajectoryPoint> for PointRow<'a> {
    fn from(p: &'a TrajectoryPoint) -> Self {
        PointRow {
            latitude: p.latitude(),
            longitude: p.longitude(),
            altitude: p.altitude(),
            timestamp: p.timestamp().format("%Y-%m-%dT%H:%M:%S").to_string(),
            date: p.source_date(),
            time: p.source_time(),
        }
    }
}

/// Write points as CSV with a header row; unknown altitude is an empty cell.
pub fn write_points_csv<W: Write>(points: &[TrajectoryPoint], writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    for p in points {
        wtr.serialize(PointRow::from(p))?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn save_points_csv(points: &[TrajectoryPoint], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| TrajectoryError::io(path, e))?;
    write_points_csv(points, file)
}

fn to_gpx(points: &[TrajectoryPoint], track_name: &str) -> Result<Gpx> {
    let mut segment = TrackSegment::new();

    for p in points {
        let mut waypoint = Waypoint::new(point!(x: p.longitude(), y: p.latitude()));
        waypoint.elevation = p.altitude();

        let utc = p.timestamp().and_utc();
        let time = OffsetDateTime::from_unix_timestamp(utc.timestamp())
            .map_err(|e| TrajectoryError::TimestampOutOfRange(e.to_string()))?;
        waypoint.time = Some(time.into());

        segment.points.push(waypoint);
    }

    let mut track = Track::new();
    track.name = Some(track_name.to_string());
    track.segments.push(segment);

    Ok(Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("trajectory-cleaner".to_string()),
        tracks: vec![track],
        ..Default::default()
    })
}

pub fn write_points_gpx<W: Write>(points: &[TrajectoryPoint], track_name: &str, writer: W) -> Result<()> {
    let gpx = to_gpx(points, track_name)?;
    gpx::write(&gpx, writer)?;
    Ok(())
}

pub fn save_points_gpx(points: &[TrajectoryPoint], track_name: &str, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| TrajectoryError::io(path, e))?;
    write_points_gpx(points, track_name, file)
}
