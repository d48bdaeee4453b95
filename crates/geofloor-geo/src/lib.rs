//! Geodesic distances, country boundaries and the country distance matrix.

pub mod build;
pub mod distance;
pub mod error;
pub mod geometry;
pub mod matrix;
pub mod names;
pub mod planar;

pub use build::{build_matrix, pair_distance_km, reconcile, BuildSettings, MatrixBuild};
pub use distance::{distance_between, haversine_km, HopDistance, EARTH_RADIUS_KM};
pub use error::GeoError;
pub use geometry::{nearest_points, Boundary, FeatureCollection};
pub use matrix::CountryDistanceMatrix;
pub use names::{CountryDictionary, CountryRecord, Resolution};
