//! Polygon regions in geographic coordinates

use serde::{Deserialize, Serialize};

use crate::types::{BoundingBox, SarError, SarResult};

const BOUNDARY_EPSILON: f64 = 1e-12;

/// Closed polygon ring of `(lon, lat)` vertices.
///
/// The closing vertex is implicit: a ring given with `first == last` is stored
/// without the duplicate. Serialized as a list of `[lon, lat]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f64; 2]>", into = "Vec<[f64; 2]>")]
pub struct Region {
    vertices: Vec<(f64, f64)>,
}

impl Region {
    pub fn new(mut vertices: Vec<(f64, f64)>) -> SarResult<Self> {
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        if vertices.len() < 3 {
            return Err(SarError::InvalidFormat(format!(
                "A region needs at least 3 distinct vertices, got {}",
                vertices.len()
            )));
        }

        for &(lon, lat) in &vertices {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(SarError::InvalidFormat(format!(
                    "Longitude {} must be between -180 and 180",
                    lon
                )));
            }
            if !(-90.0..=90.0).contains(&lat) {
                return Err(SarError::InvalidFormat(format!(
                    "Latitude {} must be between -90 and 90",
                    lat
                )));
            }
        }

        Ok(Self { vertices })
    }

    /// Axis-aligned rectangle spanning the two corners
    pub fn rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> SarResult<Self> {
        Self::new(vec![
            (min_lon, max_lat),
            (min_lon, min_lat),
            (max_lon, min_lat),
            (max_lon, max_lat),
        ])
    }

    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox {
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
        };
        for &(lon, lat) in &self.vertices {
            bbox.min_lon = bbox.min_lon.min(lon);
            bbox.max_lon = bbox.max_lon.max(lon);
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lat = bbox.max_lat.max(lat);
        }
        bbox
    }

    /// Vertex average, good enough to centre a map view on a small site
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.vertices.len() as f64;
        let (sum_lon, sum_lat) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(a, b), &(lon, lat)| (a + lon, b + lat));
        (sum_lon / n, sum_lat / n)
    }

    fn edges(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Point-in-polygon test (even-odd rule). Points on the boundary are inside.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let mut inside = false;

        for (a, b) in self.edges() {
            if on_segment((lon, lat), a, b) {
                return true;
            }

            let (xi, yi) = a;
            let (xj, yj) = b;
            if (yi > lat) != (yj > lat) {
                let x_cross = xi + (lat - yi) * (xj - xi) / (yj - yi);
                if lon < x_cross {
                    inside = !inside;
                }
            }
        }

        inside
    }

    /// True when the polygons overlap or touch
    pub fn intersects(&self, other: &Region) -> bool {
        if !self.bounding_box().intersects(&other.bounding_box()) {
            return false;
        }

        if self.vertices.iter().any(|&(x, y)| other.contains(x, y))
            || other.vertices.iter().any(|&(x, y)| self.contains(x, y))
        {
            return true;
        }

        self.edges()
            .any(|(a, b)| other.edges().any(|(c, d)| segments_intersect(a, b, c, d)))
    }
}

impl TryFrom<Vec<[f64; 2]>> for Region {
    type Error = SarError;

    fn try_from(ring: Vec<[f64; 2]>) -> Result<Self, Self::Error> {
        Region::new(ring.into_iter().map(|[lon, lat]| (lon, lat)).collect())
    }
}

impl From<Region> for Vec<[f64; 2]> {
    fn from(region: Region) -> Self {
        region.vertices.into_iter().map(|(lon, lat)| [lon, lat]).collect()
    }
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn on_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> bool {
    cross(a, b, p).abs() <= BOUNDARY_EPSILON
        && p.0 >= a.0.min(b.0) - BOUNDARY_EPSILON
        && p.0 <= a.0.max(b.0) + BOUNDARY_EPSILON
        && p.1 >= a.1.min(b.1) - BOUNDARY_EPSILON
        && p.1 <= a.1.max(b.1) + BOUNDARY_EPSILON
}

fn segments_intersect(a: (f64, f64), b: (f64, f64), c: (f64, f64), d: (f64, f64)) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    on_segment(a, c, d) || on_segment(b, c, d) || on_segment(c, a, b) || on_segment(d, a, b)
}
