/// PLT trajectory log reader (Geolife layout).
///
/// A PLT file has six header lines followed by one fix per line:
///
/// ```text
/// 39.984702,116.318417,0,492,39744.1201851852,2008-10-23,02:53:04
/// lat       lon        -  alt day-number       date       time
/// ```
///
/// Lines with a different field count or unparseable values are skipped, not
/// fatal, and logged with their line number in the file. Altitude is in feet;
/// `-777` means unknown.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{Position, ReaderBuilder, StringRecord, Trim};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, TrajectoryError};
use crate::trajectory::{sort_by_timestamp, TrajectoryPoint};

pub const HEADER_LINES: usize = 6;
pub const INVALID_ALTITUDE: f64 = -777.0;
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const FIELD_COUNT: usize = 7;
const LATITUDE_IDX: usize = 0;
const LONGITUDE_IDX: usize = 1;
const ALTITUDE_IDX: usize = 3;
const DATE_STR_IDX: usize = 5;
const TIME_STR_IDX: usize = 6;

#[derive(Debug, Error)]
enum RecordError {
    #[error("expected 7 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid number {value:?} in field {field}")]
    Number { field: usize, value: String },
    #[error("invalid date/time {0:?}")]
    DateTime(String),
}

fn parse_number(record: &StringRecord, field: usize) -> std::result::Result<f64, RecordError> {
    let value = record.get(field).unwrap_or_default();
    value.parse::<f64>().map_err(|_| RecordError::Number {
        field,
        value: value.to_string(),
    })
}

fn parse_record(record: &StringRecord) -> std::result::Result<TrajectoryPoint, RecordError> {
    if record.len() != FIELD_COUNT {
        return Err(RecordError::FieldCount(record.len()));
    }

    let latitude = parse_number(record, LATITUDE_IDX)?;
    let longitude = parse_number(record, LONGITUDE_IDX)?;
    let altitude = parse_number(record, ALTITUDE_IDX)?;

    let date_str = &record[DATE_STR_IDX];
    let time_str = &record[TIME_STR_IDX];
    let stamp = format!("{} {}", date_str, time_str);
    let timestamp = NaiveDateTime::parse_from_str(&stamp, DATETIME_FORMAT)
        .map_err(|_| RecordError::DateTime(stamp.clone()))?;

    let altitude = if altitude == INVALID_ALTITUDE { None } else { Some(altitude) };

    Ok(TrajectoryPoint::new(latitude, longitude, altitude, timestamp, date_str, time_str))
}

/// Parse PLT content, returning points sorted by timestamp.
///
/// The header is skipped by physical line, blank lines included, before any
/// record parsing. Fields are split on commas only; quotes carry no meaning.
/// `source` labels log messages and I/O errors.
pub fn read_plt<R: Read>(reader: R, source: &str) -> Result<Vec<TrajectoryPoint>> {
    let mut reader = BufReader::new(reader);
    let mut header_line = Vec::new();
    for _ in 0..HEADER_LINES {
        header_line.clear();
        let read = reader
            .read_until(b'\n', &mut header_line)
            .map_err(|e| TrajectoryError::io(source, e))?;
        if read == 0 {
            return Ok(Vec::new());
        }
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                let line = file_line(e.position());
                warn!("{}: unreadable record on line {}: {}", source, line, e);
                skipped += 1;
                continue;
            }
        };

        match parse_record(&record) {
            Ok(point) => points.push(point),
            Err(RecordError::FieldCount(n)) => {
                debug!("{}: skipping line {} with {} fields", source, file_line(record.position()), n);
                skipped += 1;
            }
            Err(e) => {
                warn!("{}: error parsing line {}: {}", source, file_line(record.position()), e);
                skipped += 1;
            }
        }
    }

    sort_by_timestamp(&mut points);

    debug!("{}: parsed {} points, skipped {} lines", source, points.len(), skipped);
    Ok(points)
}

/// Line number in the whole file for a position reported past the header.
fn file_line(position: Option<&Position>) -> u64 {
    position.map_or(0, |p| p.line() + HEADER_LINES as u64)
}

pub fn load_plt_file(path: &Path) -> Result<Vec<TrajectoryPoint>> {
    let file = File::open(path).map_err(|e| TrajectoryError::io(path, e))?;
    read_plt(file, &path.display().to_string())
}

/// Load every `*.plt` directly inside `dir`, keyed by file stem.
///
/// Files that fail to load are logged and left out.
pub fn load_plt_directory(dir: &Path) -> Result<BTreeMap<String, Vec<TrajectoryPoint>>> {
    let mut trajectories = BTreeMap::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !has_extension(path, "plt") {
            continue;
        }

        let trajectory_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        match load_plt_file(path) {
            Ok(points) => {
                trajectories.insert(trajectory_id, points);
            }
            Err(e) => warn!("error loading trajectory {}: {}", trajectory_id, e),
        }
    }

    Ok(trajectories)
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Geolife trajectory\nWGS 84\nAltitude is in Feet\nReserved 3\n0,2,255,My Track,0,0,2,8421376\n0\n";

    #[test]
    fn test_parses_records_after_header() {
        let content = format!(
            "{HEADER}39.984702,116.318417,0,492,39744.1201851852,2008-10-23,02:53:04\n\
             39.984683,116.31845,0,-777,39744.1202546296,2008-10-23,02:53:10\n"
        );
        let points = read_plt(content.as_bytes(), "test").unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].latitude(), 39.984702);
        assert_eq!(points[0].altitude(), Some(492.0));
        assert_eq!(points[1].altitude(), None);
        assert_eq!(points[1].source_date(), "2008-10-23");
        assert_eq!(points[1].source_time(), "02:53:10");
        assert_eq!(points[1].timestamp().to_string(), "2008-10-23 02:53:10");
    }

    #[test]
    fn test_skips_malformed_lines() {
        let content = format!(
            "{HEADER}39.98,116.31,0,492,39744.12,2008-10-23,02:53:04\n\
             39.98,116.31,0,492,2008-10-23,02:53:05\n\
             north,116.31,0,492,39744.12,2008-10-23,02:53:06\n\
             39.98,116.31,0,492,39744.12,2008-13-45,02:53:07\n\
             39.98,116.32,0,492,39744.12,2008-10-23,02:53:08,extra\n\
             39.99,116.31,0,492,39744.12,2008-10-23,02:53:09\n"
        );
        let points = read_plt(content.as_bytes(), "test").unwrap();

        let lats: Vec<f64> = points.iter().map(|p| p.latitude()).collect();
        assert_eq!(lats, vec![39.98, 39.99]);
    }

    #[test]
    fn test_output_sorted_by_timestamp() {
        let content = format!(
            "{HEADER}1.0,1.0,0,0,0,2008-10-23,10:00:00\n\
             2.0,2.0,0,0,0,2008-10-23,09:00:00\n\
             3.0,3.0,0,0,0,2008-10-22,23:59:59\n"
        );
        let points = read_plt(content.as_bytes(), "test").unwrap();
        let lats: Vec<f64> = points.iter().map(|p| p.latitude()).collect();
        assert_eq!(lats, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_blank_header_line_still_counts() {
        let content = "Geolife trajectory\nWGS 84\nAltitude is in Feet\n\n0,2,255,My Track,0,0,2,8421376\n0\n\
             39.1,116.31,0,492,39744.12,2008-10-23,02:53:04\n\
             39.2,116.31,0,492,39744.12,2008-10-23,02:53:05\n";
        let points = read_plt(content.as_bytes(), "test").unwrap();

        let lats: Vec<f64> = points.iter().map(|p| p.latitude()).collect();
        assert_eq!(lats, vec![39.1, 39.2]);
    }

    #[test]
    fn test_quotes_do_not_join_lines() {
        let content = format!(
            "{HEADER}39.1,116.31,0,492,\"39744.12,2008-10-23,02:53:04\n\
             39.2,116.31,0,492,39744.12,2008-10-23,02:53:05\n"
        );
        let points = read_plt(content.as_bytes(), "test").unwrap();

        // the stray quote sits in the unused day-number field
        let lats: Vec<f64> = points.iter().map(|p| p.latitude()).collect();
        assert_eq!(lats, vec![39.1, 39.2]);
    }

    #[test]
    fn test_file_line_offsets_header() {
        let mut pos = Position::new();
        pos.set_line(1);
        assert_eq!(file_line(Some(&pos)), 7);
        assert_eq!(file_line(None), 0);
    }

    #[test]
    fn test_header_only() {
        assert!(read_plt(HEADER.as_bytes(), "test").unwrap().is_empty());
        assert!(read_plt("".as_bytes(), "test").unwrap().is_empty());
        assert!(read_plt("Geolife trajectory\nWGS 84\n".as_bytes(), "test").unwrap().is_empty());
    }

    #[test]
    fn test_extension_match() {
        assert!(has_extension(Path::new("a/20081023025304.PLT"), "plt"));
        assert!(!has_extension(Path::new("a/notes.txt"), "plt"));
        assert!(!has_extension(Path::new("a/plt"), "plt"));
    }
}
