//! Planar helpers over (longitude, latitude) degrees.

use geofloor_model::Coordinates;
use std::ops::{Add, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn dot(self, other: Self) -> f64 {
        self.lon * other.lon + self.lat * other.lat
    }

    pub fn cross(self, other: Self) -> f64 {
        self.lon * other.lat - self.lat * other.lon
    }

    pub fn distance_sq(self, other: Self) -> f64 {
        let d = self - other;
        d.dot(d)
    }

    pub fn shifted(self, lon_offset: f64) -> Self {
        Self::new(self.lon + lon_offset, self.lat)
    }

    pub fn to_coordinates(self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.lon + rhs.lon, self.lat + rhs.lat)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.lon - rhs.lon, self.lat - rhs.lat)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.lon * rhs, self.lat * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for point in iter {
            bbox.min = Point::new(bbox.min.lon.min(point.lon), bbox.min.lat.min(point.lat));
            bbox.max = Point::new(bbox.max.lon.max(point.lon), bbox.max.lat.max(point.lat));
        }
        Some(bbox)
    }

    pub fn shifted(self, lon_offset: f64) -> Self {
        Self {
            min: self.min.shifted(lon_offset),
            max: self.max.shifted(lon_offset),
        }
    }

    /// Squared gap between two boxes; a lower bound for any point pair inside them.
    pub fn distance_sq(&self, other: &Self) -> f64 {
        let dx = (self.min.lon - other.max.lon)
            .max(other.min.lon - self.max.lon)
            .max(0.0);
        let dy = (self.min.lat - other.max.lat)
            .max(other.min.lat - self.max.lat)
            .max(0.0);
        dx * dx + dy * dy
    }
}

/// Closest point to `p` on segment `a`-`b`.
pub fn project_onto_segment(p: Point, a: Point, b: Point) -> Point {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq == 0.0 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

pub fn segment_intersection(p1: Point, p2: Point, q1: Point, q2: Point) -> Option<Point> {
    let r = p2 - p1;
    let s = q2 - q1;
    let denom = r.cross(s);
    if denom == 0.0 {
        // Parallel or collinear; overlaps are caught by endpoint projection.
        return None;
    }
    let qp = q1 - p1;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(p1 + r * t)
    } else {
        None
    }
}

/// Closest pair of points between segments `p1`-`p2` and `q1`-`q2`.
pub fn closest_between_segments(p1: Point, p2: Point, q1: Point, q2: Point) -> (Point, Point) {
    if let Some(hit) = segment_intersection(p1, p2, q1, q2) {
        return (hit, hit);
    }

    let candidates = [
        (p1, project_onto_segment(p1, q1, q2)),
        (p2, project_onto_segment(p2, q1, q2)),
        (project_onto_segment(q1, p1, p2), q1),
        (project_onto_segment(q2, p1, p2), q2),
    ];

    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.0.distance_sq(candidate.1) < best.0.distance_sq(best.1) {
            best = *candidate;
        }
    }
    best
}

/// Even-odd rule; `ring` is expected to be closed.
pub fn ring_contains(ring: &[Point], p: Point) -> bool {
    let mut inside = false;
    for edge in ring.windows(2) {
        let (a, b) = (edge[0], edge[1]);
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let x = a.lon + (p.lat - a.lat) * (b.lon - a.lon) / (b.lat - a.lat);
            if p.lon < x {
                inside = !inside;
            }
        }
    }
    inside
}
