//! Country boundaries read from GeoJSON and the nearest-point search between them.

use crate::error::GeoError;
use crate::planar::{closest_between_segments, ring_contains, BBox, Point};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Shifts tried for the second boundary so pairs across the antimeridian
/// (Chukotka and Alaska) are measured the short way round.
const LON_OFFSETS: [f64; 3] = [0.0, 360.0, -360.0];

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .as_ref()?
            .get(key)?
            .as_str()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone)]
pub struct Polygon {
    pub exterior: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
    bbox: BBox,
}

impl Polygon {
    pub fn new(exterior: Vec<Point>, holes: Vec<Vec<Point>>) -> Option<Self> {
        let bbox = BBox::from_points(&exterior)?;
        Some(Self {
            exterior,
            holes,
            bbox,
        })
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn contains(&self, p: Point) -> bool {
        ring_contains(&self.exterior, p) && !self.holes.iter().any(|hole| ring_contains(hole, p))
    }

    fn rings(&self) -> impl Iterator<Item = &Vec<Point>> {
        std::iter::once(&self.exterior).chain(self.holes.iter())
    }

    fn shifted(&self, lon_offset: f64) -> Self {
        let shift = |ring: &Vec<Point>| -> Vec<Point> {
            ring.iter().map(|p| p.shifted(lon_offset)).collect()
        };
        Self {
            exterior: shift(&self.exterior),
            holes: self.holes.iter().map(shift).collect(),
            bbox: self.bbox.shifted(lon_offset),
        }
    }
}

/// Every polygon belonging to one country, holes included.
#[derive(Debug, Clone, Default)]
pub struct Boundary {
    pub polygons: Vec<Polygon>,
}

impl Boundary {
    pub fn from_geometry(geometry: &Geometry) -> Result<Self, GeoError> {
        let polygons = match geometry {
            Geometry::Polygon { coordinates } => vec![coordinates],
            Geometry::MultiPolygon { coordinates } => coordinates.iter().collect(),
            Geometry::Unsupported => {
                return Err(GeoError::InvalidGeometry(
                    "expected Polygon or MultiPolygon".to_string(),
                ))
            }
        };

        let mut boundary = Boundary::default();
        for rings in polygons {
            let mut rings = rings.iter();
            let exterior = match rings.next() {
                Some(ring) => parse_ring(ring)?,
                None => continue,
            };
            let holes = rings
                .map(|ring| parse_ring(ring))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .filter(|ring| ring.len() >= 2)
                .collect();
            if exterior.len() < 2 {
                continue;
            }
            if let Some(polygon) = Polygon::new(exterior, holes) {
                boundary.polygons.push(polygon);
            }
        }
        Ok(boundary)
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn extend(&mut self, other: Boundary) {
        self.polygons.extend(other.polygons);
    }

    pub fn contains(&self, p: Point) -> bool {
        self.polygons.iter().any(|polygon| polygon.contains(p))
    }
}

fn parse_ring(ring: &[Vec<f64>]) -> Result<Vec<Point>, GeoError> {
    let mut points = Vec::with_capacity(ring.len() + 1);
    for position in ring {
        match position.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => {
                points.push(Point::new(*lon, *lat))
            }
            _ => {
                return Err(GeoError::InvalidGeometry(format!(
                    "bad position {position:?}"
                )))
            }
        }
    }
    if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
        if first != last {
            points.push(first);
        }
    }
    Ok(points)
}

/// Pair of points, one on each boundary, with the smallest planar separation.
/// Touching, crossing or enclosing boundaries yield the same point twice.
pub fn nearest_points(a: &Boundary, b: &Boundary) -> Option<(Point, Point)> {
    let mut best: Option<(f64, Point, Point)> = None;

    for pa in &a.polygons {
        for pb in &b.polygons {
            for offset in LON_OFFSETS {
                let bound = pa.bbox().distance_sq(&pb.bbox().shifted(offset));
                if matches!(best, Some((d, _, _)) if bound >= d) {
                    continue;
                }

                let shifted;
                let pb_view = if offset == 0.0 {
                    pb
                } else {
                    shifted = pb.shifted(offset);
                    &shifted
                };

                if let Some(p) = enclosed_vertex(pa, pb_view) {
                    return Some((p, p.shifted(-offset)));
                }

                if let Some((d, p, q)) = closest_between_polygons(pa, pb_view) {
                    if best.map_or(true, |(best_d, _, _)| d < best_d) {
                        best = Some((d, p, q.shifted(-offset)));
                    }
                    if d == 0.0 {
                        return best.map(|(_, p, q)| (p, q));
                    }
                }
            }
        }
    }

    best.map(|(_, p, q)| (p, q))
}

fn enclosed_vertex(a: &Polygon, b: &Polygon) -> Option<Point> {
    let a_first = a.exterior.first().copied()?;
    if b.contains(a_first) {
        return Some(a_first);
    }
    let b_first = b.exterior.first().copied()?;
    if a.contains(b_first) {
        return Some(b_first);
    }
    None
}

fn closest_between_polygons(a: &Polygon, b: &Polygon) -> Option<(f64, Point, Point)> {
    let mut best: Option<(f64, Point, Point)> = None;
    for ring_a in a.rings() {
        for seg_a in ring_a.windows(2) {
            for ring_b in b.rings() {
                for seg_b in ring_b.windows(2) {
                    let (p, q) = closest_between_segments(seg_a[0], seg_a[1], seg_b[0], seg_b[1]);
                    let d = p.distance_sq(q);
                    if best.map_or(true, |(best_d, _, _)| d < best_d) {
                        best = Some((d, p, q));
                        if d == 0.0 {
                            return best;
                        }
                    }
                }
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Vec<Vec<f64>> {
        vec![
            vec![min_lon, min_lat],
            vec![max_lon, min_lat],
            vec![max_lon, max_lat],
            vec![min_lon, max_lat],
            vec![min_lon, min_lat],
        ]
    }

    fn boundary(rings: Vec<Vec<Vec<f64>>>) -> Boundary {
        Boundary::from_geometry(&Geometry::Polygon { coordinates: rings }).unwrap()
    }

    #[test]
    fn disjoint_rectangles_meet_at_facing_edges() {
        let a = boundary(vec![rect(0.0, 0.0, 1.0, 1.0)]);
        let b = boundary(vec![rect(3.0, 0.0, 4.0, 1.0)]);
        let (p, q) = nearest_points(&a, &b).unwrap();
        assert!((p.lon - 1.0).abs() < 1e-12);
        assert!((q.lon - 3.0).abs() < 1e-12);
        assert!((p.lat - q.lat).abs() < 1e-12);
    }

    #[test]
    fn enclave_is_at_zero_distance() {
        let outer = boundary(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let inner = boundary(vec![rect(4.0, 4.0, 5.0, 5.0)]);
        let (p, q) = nearest_points(&outer, &inner).unwrap();
        assert_eq!(p.distance_sq(q), 0.0);
    }

    #[test]
    fn island_in_lake_is_not_enclosed() {
        let with_lake = boundary(vec![rect(0.0, 0.0, 10.0, 10.0), rect(2.0, 2.0, 8.0, 8.0)]);
        let island = boundary(vec![rect(4.0, 4.0, 5.0, 5.0)]);
        let (p, q) = nearest_points(&with_lake, &island).unwrap();
        assert!((p.distance_sq(q) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn antimeridian_pair_uses_short_way() {
        let west = boundary(vec![rect(170.0, 60.0, 179.5, 65.0)]);
        let east = boundary(vec![rect(-179.5, 60.0, -170.0, 65.0)]);
        let (p, q) = nearest_points(&west, &east).unwrap();
        assert!((p.lon - 179.5).abs() < 1e-9);
        assert!((q.lon + 179.5).abs() < 1e-9);
    }

    #[test]
    fn unclosed_ring_is_closed_on_parse() {
        let b = boundary(vec![vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]]]);
        assert_eq!(b.polygons[0].exterior.len(), 4);
    }

    #[test]
    fn bad_position_is_rejected() {
        let geometry = Geometry::Polygon {
            coordinates: vec![vec![vec![0.0], vec![1.0, 0.0]]],
        };
        assert!(matches!(
            Boundary::from_geometry(&geometry),
            Err(GeoError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn point_geometry_deserializes_as_unsupported() {
        let geometry: Geometry =
            serde_json::from_str(r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#).unwrap();
        assert!(matches!(geometry, Geometry::Unsupported));
    }
}
