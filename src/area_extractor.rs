/// Area of interest: point-in-polygon filtering and polygon statistics.
///
/// Vertices are `(latitude, longitude)` pairs. Internally the ring is a
/// `geo::LineString` with `x = longitude, y = latitude`.
///
/// Containment is ray casting eastward from the test point. Points on the
/// boundary count as inside, and an edge is crossed only when its intercept
/// lies strictly east of the point.

use geo::{BoundingRect, Coord, LineString, Rect};

use crate::error::{Result, TrajectoryError};
use crate::point_filter::PointFilter;
use crate::trajectory::{Position, TrajectoryPoint};

/// Meters per degree used by the flat-Earth area estimate.
pub const METERS_PER_DEGREE: f64 = 111_319.9;

/// Shape of a polygon edge, classified once at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeKind {
    /// Constant latitude. Zero-length edges land here too.
    Horizontal { lat: f64, min_lon: f64, max_lon: f64 },
    /// Constant longitude with distinct end latitudes.
    Vertical { lon: f64, min_lat: f64, max_lat: f64 },
    /// Anything else; `slope` is d(lat)/d(lon).
    Slanted { slope: f64 },
}

/// Outcome of testing one edge against the eastward ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeHit {
    Boundary,
    Crossing,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    start: Coord<f64>,
    end: Coord<f64>,
    kind: EdgeKind,
}

impl Edge {
    pub fn new(start: Coord<f64>, end: Coord<f64>) -> Self {
        let kind = if start.y == end.y {
            EdgeKind::Horizontal {
                lat: start.y,
                min_lon: start.x.min(end.x),
                max_lon: start.x.max(end.x),
            }
        } else if start.x == end.x {
            EdgeKind::Vertical {
                lon: start.x,
                min_lat: start.y.min(end.y),
                max_lat: start.y.max(end.y),
            }
        } else {
            EdgeKind::Slanted {
                slope: (end.y - start.y) / (end.x - start.x),
            }
        };

        Edge { start, end, kind }
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    fn straddles(&self, lat: f64) -> bool {
        let (y1, y2) = (self.start.y, self.end.y);
        (y1 <= lat && y2 > lat) || (y2 <= lat && y1 > lat)
    }

    pub fn test(&self, lat: f64, lon: f64) -> EdgeHit {
        match self.kind {
            EdgeKind::Horizontal { lat: y, min_lon, max_lon } => {
                if y == lat && min_lon <= lon && lon <= max_lon {
                    EdgeHit::Boundary
                } else {
                    EdgeHit::Miss
                }
            }
            EdgeKind::Vertical { lon: x, min_lat, max_lat } => {
                if x == lon && min_lat <= lat && lat <= max_lat {
                    EdgeHit::Boundary
                } else if self.straddles(lat) && x > lon {
                    EdgeHit::Crossing
                } else {
                    EdgeHit::Miss
                }
            }
            EdgeKind::Slanted { slope } => {
                if !self.straddles(lat) {
                    return EdgeHit::Miss;
                }
                let x_intersect = self.start.x + (lat - self.start.y) / slope;
                if x_intersect == lon {
                    EdgeHit::Boundary
                } else if x_intersect > lon {
                    EdgeHit::Crossing
                } else {
                    EdgeHit::Miss
                }
            }
        }
    }
}

/// Close a `(lat, lon)` ring by repeating its first vertex if needed.
pub fn close_ring(vertices: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut ring = to_line_string(vertices);
    ring.close();
    from_line_string(&ring)
}

fn to_line_string(vertices: &[(f64, f64)]) -> LineString<f64> {
    vertices
        .iter()
        .map(|&(lat, lon)| Coord { x: lon, y: lat })
        .collect()
}

fn from_line_string(ring: &LineString<f64>) -> Vec<(f64, f64)> {
    ring.coords().map(|c| (c.y, c.x)).collect()
}

#[derive(Debug, Clone)]
pub struct AreaExtractor {
    ring: LineString<f64>,
    edges: Vec<Edge>,
    bounds: Rect<f64>,
}

impl AreaExtractor {
    /// Build an extractor from `(lat, lon)` vertices, closing the ring if needed.
    ///
    /// Fails with `InvalidGeometry` unless there are at least three distinct
    /// finite vertices.
    pub fn new(vertices: &[(f64, f64)]) -> Result<Self> {
        if vertices.iter().any(|(lat, lon)| !lat.is_finite() || !lon.is_finite()) {
            return Err(TrajectoryError::InvalidGeometry(
                "polygon vertices must be finite numbers".to_string(),
            ));
        }

        let mut distinct: Vec<(f64, f64)> = Vec::with_capacity(vertices.len());
        for v in vertices {
            if !distinct.contains(v) {
                distinct.push(*v);
            }
        }
        if distinct.len() < 3 {
            return Err(TrajectoryError::InvalidGeometry(format!(
                "polygon must have at least 3 distinct points, got {}",
                distinct.len()
            )));
        }

        let mut ring = to_line_string(vertices);
        ring.close();

        let edges = ring.lines().map(|line| Edge::new(line.start, line.end)).collect();
        let bounds = ring
            .bounding_rect()
            .ok_or_else(|| TrajectoryError::InvalidGeometry("polygon has no extent".to_string()))?;

        Ok(AreaExtractor { ring, edges, bounds })
    }

    /// Closed ring as `(lat, lon)` pairs; the first vertex is repeated at the end.
    pub fn vertices(&self) -> Vec<(f64, f64)> {
        from_line_string(&self.ring)
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    fn open_ring(&self) -> &[Coord<f64>] {
        let coords = &self.ring.0;
        &coords[..coords.len() - 1]
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let mut crossings = 0usize;

        for edge in &self.edges {
            match edge.test(lat, lon) {
                EdgeHit::Boundary => return true,
                EdgeHit::Crossing => crossings += 1,
                EdgeHit::Miss => {}
            }
        }

        crossings % 2 == 1
    }

    pub fn contains_point<P: Position>(&self, point: &P) -> bool {
        let (lat, lon) = point.lat_lon();
        self.contains(lat, lon)
    }

    /// Points inside the polygon, in their original order.
    pub fn filter(&self, points: &[TrajectoryPoint]) -> Vec<TrajectoryPoint> {
        self.apply(points)
    }

    /// Vertex mean `(lat, lon)` of the open ring. Planar, not area-weighted.
    pub fn centroid(&self) -> (f64, f64) {
        let open = self.open_ring();
        let n = open.len() as f64;
        let lat = open.iter().map(|c| c.y).sum::<f64>() / n;
        let lon = open.iter().map(|c| c.x).sum::<f64>() / n;
        (lat, lon)
    }

    /// `(min_lat, min_lon, max_lat, max_lon)`.
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        let (min, max) = (self.bounds.min(), self.bounds.max());
        (min.y, min.x, max.y, max.x)
    }

    /// Shoelace area over raw degrees scaled by `METERS_PER_DEGREE^2`.
    ///
    /// Flat-Earth approximation, only meaningful for small regions.
    pub fn estimate_area(&self) -> f64 {
        let open = self.open_ring();
        let n = open.len();

        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            let (lat1, lon1) = (open[i].y, open[i].x);
            let (lat2, lon2) = (open[j].y, open[j].x);
            area += lat1 * lon2 - lat2 * lon1;
        }

        area.abs() * 0.5 * METERS_PER_DEGREE.powi(2)
    }
}

impl PointFilter for AreaExtractor {
    fn name(&self) -> &'static str {
        "area"
    }

    fn keep_mask(&self, points: &[TrajectoryPoint]) -> Vec<bool> {
        points.iter().map(|p| self.contains_point(p)).collect()
    }
}
