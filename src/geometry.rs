//! Planar geometry on latitude/longitude pairs.
//!
//! Containment and segment intersection treat degrees as plane coordinates,
//! which holds well enough at the scale of a road zone (a few hundred metres
//! to a few kilometres) sampled every few seconds. Distances use the
//! haversine great-circle formula.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Haversine distance to `other` in metres.
    pub fn distance_m(&self, other: LatLng) -> f64 {
        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_M * c
    }
}

/// Axis-aligned rectangle around a polygon, used as a cheap pre-filter.
///
/// When the polygon straddles the antimeridian the box wraps as well and
/// `west` is greater than `east`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Smallest box containing every vertex, or `None` for an empty ring.
    pub fn from_vertices(vertices: &[LatLng]) -> Option<Self> {
        let first = vertices.first()?;
        let wraps = ring_crosses_dateline(vertices);
        let lng = |vertex: &LatLng| {
            if wraps && vertex.lng < 0.0 {
                vertex.lng + 360.0
            } else {
                vertex.lng
            }
        };

        let mut bounds = Self {
            north: first.lat,
            south: first.lat,
            east: lng(first),
            west: lng(first),
        };
        for vertex in &vertices[1..] {
            bounds.north = bounds.north.max(vertex.lat);
            bounds.south = bounds.south.min(vertex.lat);
            bounds.east = bounds.east.max(lng(vertex));
            bounds.west = bounds.west.min(lng(vertex));
        }

        if wraps {
            bounds.east = normalize_lng(bounds.east);
            bounds.west = normalize_lng(bounds.west);
        }
        Some(bounds)
    }

    pub fn crosses_dateline(&self) -> bool {
        self.west > self.east
    }

    pub fn contains(&self, point: LatLng) -> bool {
        if point.lat > self.north || point.lat < self.south {
            return false;
        }
        if self.crosses_dateline() {
            point.lng >= self.west || point.lng <= self.east
        } else {
            point.lng >= self.west && point.lng <= self.east
        }
    }
}

fn ring_crosses_dateline(vertices: &[LatLng]) -> bool {
    let Some(last) = vertices.last() else {
        return false;
    };
    let mut previous = last;
    for vertex in vertices {
        if (vertex.lng - previous.lng).abs() > 180.0 {
            return true;
        }
        previous = vertex;
    }
    false
}

fn normalize_lng(lng: f64) -> f64 {
    if lng > 180.0 { lng - 360.0 } else { lng }
}

/// Shift a longitude by whole turns until it shares the sign of the test point.
fn unwrap_lng(mut lng: f64, towards_positive: bool) -> f64 {
    if !lng.is_finite() {
        return lng;
    }
    if towards_positive {
        while lng < 0.0 {
            lng += 360.0;
        }
    } else {
        while lng > 0.0 {
            lng -= 360.0;
        }
    }
    lng
}

/// Crossing-number point-in-polygon test.
///
/// A ray is cast north from `point`; every polygon edge spanning the point's
/// longitude (half-open: `x1 <= x < x2` or `x1 >= x > x2`) whose crossing
/// latitude lies above the point toggles the result. The half-open rule
/// counts a shared vertex exactly once, so a point on the west or north edge
/// of an axis-aligned box is outside and one on the east or south edge is
/// inside.
pub fn contains(point: LatLng, polygon: &[LatLng], bounds: &BoundingBox) -> bool {
    if !point.is_finite() || !bounds.contains(point) {
        return false;
    }
    let Some(&last) = polygon.last() else {
        return false;
    };

    let x = point.lng;
    let mut inside = false;
    let mut last_point = last;
    for &vertex in polygon {
        let mut x1 = last_point.lng;
        let mut x2 = vertex.lng;
        let mut dx = x2 - x1;

        if dx.abs() > 180.0 {
            // dateline jump
            x1 = unwrap_lng(x1, x > 0.0);
            x2 = unwrap_lng(x2, x > 0.0);
            dx = x2 - x1;
        }

        if (x1 <= x && x2 > x) || (x1 >= x && x2 < x) {
            let grad = (vertex.lat - last_point.lat) / dx;
            let crossing_lat = last_point.lat + (x - x1) * grad;
            if crossing_lat > point.lat {
                inside = !inside;
            }
        }
        last_point = vertex;
    }

    inside
}

/// A straight line between two points, e.g. a vehicle's movement between
/// two samples or one edge of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: LatLng,
    pub to: LatLng,
}

impl Segment {
    pub const fn new(from: LatLng, to: LatLng) -> Self {
        Self { from, to }
    }

    /// Where this segment crosses `other`, see [`intersect`].
    pub fn intersect(&self, other: &Segment) -> Option<Intersection> {
        intersect(self, other)
    }

    /// Point at fraction `progress` (0..1) along the segment.
    pub fn point_at(&self, progress: f64) -> LatLng {
        LatLng::new(
            self.from.lat + progress * (self.to.lat - self.from.lat),
            self.from.lng + progress * (self.to.lng - self.from.lng),
        )
    }
}

/// Result of a successful segment intersection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    /// Crossing point, computed along the first segment.
    pub position: LatLng,
    /// Fraction (0..1) along the first segment at which the crossing occurs.
    pub progress: f64,
}

/// Intersect `path` with `line`.
///
/// Both segment parameters must fall in the closed interval [0, 1]. Parallel
/// and collinear segments never intersect.
pub fn intersect(path: &Segment, line: &Segment) -> Option<Intersection> {
    let a = path.from;
    let c = line.from;

    let s1_lat = path.to.lat - a.lat;
    let s1_lng = path.to.lng - a.lng;
    let s2_lat = line.to.lat - c.lat;
    let s2_lng = line.to.lng - c.lng;

    let denom = -s2_lng * s1_lat + s1_lng * s2_lat;
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }

    let s = (-s1_lat * (a.lng - c.lng) + s1_lng * (a.lat - c.lat)) / denom;
    let t = (s2_lng * (a.lat - c.lat) - s2_lat * (a.lng - c.lng)) / denom;

    if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
        Some(Intersection {
            position: path.point_at(t),
            progress: t,
        })
    } else {
        None
    }
}
