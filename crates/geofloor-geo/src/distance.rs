use crate::error::GeoError;
use crate::matrix::CountryDistanceMatrix;
use geofloor_model::{Coordinates, DistanceBasis, Hop};

/// IUGG mean Earth radius, as used by the common haversine implementations.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HopDistance {
    pub km: f64,
    pub basis: DistanceBasis,
}

/// Great-circle distance on a spherical Earth.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Distance between the claimed positions of two hops.
///
/// Coordinates win when both hops have them. Otherwise the country codes are
/// compared: the same country counts as co-located (0 km), different countries
/// go through the border-to-border matrix.
pub fn distance_between(
    a: &Hop,
    b: &Hop,
    matrix: &CountryDistanceMatrix,
) -> Result<HopDistance, GeoError> {
    if let (Some(from), Some(to)) = (a.resolved_coordinates(), b.resolved_coordinates()) {
        return Ok(HopDistance {
            km: haversine_km(from, to),
            basis: DistanceBasis::Coordinates,
        });
    }

    let from = a.country_code().ok_or_else(|| no_location(a))?;
    let to = b.country_code().ok_or_else(|| no_location(b))?;

    if from == to {
        return Ok(HopDistance {
            km: 0.0,
            basis: DistanceBasis::SameCountry,
        });
    }

    Ok(HopDistance {
        km: matrix.lookup(&from, &to)?,
        basis: DistanceBasis::CountryMatrix,
    })
}

fn no_location(hop: &Hop) -> GeoError {
    GeoError::NoLocation {
        address: hop.address.clone().unwrap_or_else(|| "unknown".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofloor_model::Geolocation;

    #[test]
    fn one_degree_of_longitude_on_equator() {
        let km = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 1.0));
        assert!((km - 111.3).abs() / 111.3 < 0.005, "got {km}");
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_self() {
        let berlin = Coordinates::new(52.52, 13.405);
        let paris = Coordinates::new(48.8566, 2.3522);
        assert_eq!(haversine_km(berlin, berlin), 0.0);
        assert!((haversine_km(berlin, paris) - haversine_km(paris, berlin)).abs() < 1e-9);
        assert!((haversine_km(berlin, paris) - 878.0).abs() < 5.0);
    }

    #[test]
    fn hop_without_country_or_coordinates_is_no_location() {
        let located = Hop {
            address: Some("a".to_string()),
            geolocation: Some(Geolocation {
                country: Some("FR".to_string()),
                ..Geolocation::default()
            }),
            ..Hop::default()
        };
        let city_only = Hop {
            address: Some("b".to_string()),
            geolocation: Some(Geolocation {
                city: Some("Lyon".to_string()),
                ..Geolocation::default()
            }),
            ..Hop::default()
        };

        let err = distance_between(&located, &city_only, &CountryDistanceMatrix::default())
            .unwrap_err();
        assert!(matches!(err, GeoError::NoLocation { address } if address == "b"));
    }

    #[test]
    fn antipodes_do_not_produce_nan() {
        let km = haversine_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
        assert!((km - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }
}
