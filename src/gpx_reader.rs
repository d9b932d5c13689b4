/// GPX input: turn track points into a time-ordered trajectory.
///
/// Points without a timestamp cannot be placed in the sequence and are
/// dropped. Elevation becomes the point altitude when present.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::DateTime;
use gpx::{read, Gpx};
use time::OffsetDateTime;
use tracing::debug;

use crate::error::{Result, TrajectoryError};
use crate::trajectory::{sort_by_timestamp, TrajectoryPoint};

pub fn read_gpx_points<R: Read>(reader: R, source: &str) -> Result<Vec<TrajectoryPoint>> {
    let gpx = read(reader)?;
    let (mut points, untimed) = extract_points(&gpx);

    if untimed > 0 {
        debug!("{}: dropped {} track points without a timestamp", source, untimed);
    }

    sort_by_timestamp(&mut points);
    debug!("{}: extracted {} timed track points", source, points.len());
    Ok(points)
}

pub fn load_gpx_file(path: &Path) -> Result<Vec<TrajectoryPoint>> {
    let file = File::open(path).map_err(|e| TrajectoryError::io(path, e))?;
    read_gpx_points(BufReader::new(file), &path.display().to_string())
}

/// Timed points of every track segment, plus the count of untimed ones.
fn extract_points(gpx: &Gpx) -> (Vec<TrajectoryPoint>, usize) {
    let mut points = Vec::new();
    let mut untimed = 0;

    for track in &gpx.tracks {
        for segment in &track.segments {
            for waypoint in &segment.points {
                let timestamp = waypoint.time.clone().and_then(|t| {
                    let t: OffsetDateTime = t.into();
                    DateTime::from_timestamp(t.unix_timestamp(), t.nanosecond())
                });

                match timestamp {
                    Some(ts) => points.push(TrajectoryPoint::at(
                        waypoint.point().y(),
                        waypoint.point().x(),
                        waypoint.elevation,
                        ts.naive_utc(),
                    )),
                    None => untimed += 1,
                }
            }
        }
    }

    (points, untimed)
}
