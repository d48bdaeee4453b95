use geofloor_geo::CountryDistanceMatrix;
use geofloor_model::{
    Coordinates, CountryDistanceEntry, DistanceBasis, Geolocation, Hop, TraceRun,
};
use geofloor_validate::{
    estimate_radius, validate, validate_runs, validate_with, GapPolicy, ValidatorSettings,
};

fn hop(address: &str, rtt: Option<f64>, country: Option<&str>, coords: Option<(f64, f64)>) -> Hop {
    Hop {
        address: Some(address.to_string()),
        rtt,
        geolocation: country.map(|code| Geolocation {
            city: None,
            region: None,
            country: Some(code.to_string()),
        }),
        coordinates: coords.map(|(lat, lon)| Coordinates::new(lat, lon)),
        rdns: None,
    }
}

fn matrix(entries: &[(&str, &str, f64)]) -> CountryDistanceMatrix {
    CountryDistanceMatrix::from_entries(entries.iter().map(|(from, to, km)| CountryDistanceEntry {
        from: from.to_string(),
        to: to.to_string(),
        km: *km,
    }))
}

fn gap_sequence() -> Vec<Hop> {
    vec![
        hop("10.0.0.1", Some(5.0), Some("DE"), Some((50.11, 8.68))),
        hop("10.0.0.2", None, Some("DE"), Some((50.11, 8.68))),
        hop("10.0.0.3", Some(12.0), Some("DE"), Some((52.52, 13.40))),
    ]
}

#[test]
fn gap_keeps_baseline_by_default() {
    let report = validate(&gap_sequence(), &CountryDistanceMatrix::default());

    assert_eq!(report.audit.len(), 3);
    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert_eq!(result.previous_address.as_deref(), Some("10.0.0.1"));
    assert_eq!(result.address.as_deref(), Some("10.0.0.3"));
    assert_eq!(result.basis, DistanceBasis::Coordinates);
    assert!(result.within_radius);
}

#[test]
fn gap_drops_baseline_under_reset_policy() {
    let settings = ValidatorSettings {
        gap_policy: GapPolicy::ResetBaseline,
        ..ValidatorSettings::default()
    };
    let report = validate_with(&gap_sequence(), &CountryDistanceMatrix::default(), &settings);

    assert_eq!(report.audit.len(), 3);
    assert!(report.results.is_empty());
}

#[test]
fn incomplete_hops_never_appear_in_results() {
    let mut empty_geo = hop("10.9.9.2", Some(3.0), None, Some((1.0, 1.0)));
    empty_geo.geolocation = Some(Geolocation::default());

    let hops = vec![
        hop("10.9.9.1", None, Some("DE"), None),
        hop("10.0.0.1", Some(2.0), Some("DE"), None),
        empty_geo,
        hop("10.9.9.3", Some(4.0), None, Some((1.0, 1.0))),
        hop("10.0.0.2", Some(6.0), Some("DE"), None),
        hop("10.9.9.4", None, None, None),
        hop("10.0.0.3", Some(8.0), Some("DE"), None),
    ];
    let report = validate(&hops, &CountryDistanceMatrix::default());

    assert_eq!(report.audit.len(), hops.len());
    assert_eq!(report.results.len(), 2);
    for result in &report.results {
        for address in [&result.address, &result.previous_address] {
            assert!(address.as_deref().unwrap().starts_with("10.0.0."));
        }
    }
    assert_eq!(report.summary.hops, 7);
    assert_eq!(report.summary.complete_hops, 3);
    assert_eq!(report.summary.verdicts, 2);
    assert_eq!(report.summary.skipped, 4);
}

#[test]
fn same_country_without_coordinates_is_zero_km() {
    let hops = vec![
        hop("a", Some(10.0), Some("fr"), None),
        hop("b", Some(10.0), Some("FR"), Some((48.85, 2.35))),
    ];
    let report = validate(&hops, &CountryDistanceMatrix::default());

    let result = &report.results[0];
    assert_eq!(result.computed_distance_km, 0.0);
    assert_eq!(result.radius_km, 0.0);
    assert_eq!(result.basis, DistanceBasis::SameCountry);
    assert!(result.within_radius);
}

#[test]
fn distance_equal_to_radius_is_within() {
    let radius = estimate_radius(Some(30.0), Some(20.0)).unwrap();
    let table = matrix(&[("DE", "PL", radius)]);
    let hops = vec![
        hop("a", Some(20.0), Some("DE"), None),
        hop("b", Some(30.0), Some("PL"), None),
    ];

    let report = validate(&hops, &table);
    let result = &report.results[0];
    assert_eq!(result.basis, DistanceBasis::CountryMatrix);
    assert_eq!(result.computed_distance_km, result.radius_km);
    assert!(result.within_radius);
    assert_eq!(report.summary.violations, 0);
}

#[test]
fn implausible_jump_is_reported_and_scan_continues() {
    let hops = vec![
        hop("fra", Some(10.0), Some("DE"), Some((50.11, 8.68))),
        hop("nyc", Some(20.0), Some("US"), Some((40.71, -74.0))),
        hop("nyc-2", Some(90.0), Some("US"), Some((40.72, -74.01))),
    ];
    let report = validate(&hops, &CountryDistanceMatrix::default());

    assert_eq!(report.results.len(), 2);
    assert!(!report.results[0].within_radius);
    assert!(report.results[0].computed_distance_km > 6000.0);
    assert!(report.results[1].within_radius);
    assert_eq!(report.summary.violations, 1);
}

#[test]
fn failed_comparison_still_advances_baseline() {
    let hops = vec![
        hop("a", Some(1.0), Some("DE"), Some((50.0, 8.0))),
        // No matrix entry for DE -> ZZ: no verdict, but "b" becomes the baseline.
        hop("b", Some(2.0), Some("ZZ"), None),
        hop("c", Some(3.0), Some("ZZ"), None),
    ];
    let report = validate(&hops, &CountryDistanceMatrix::default());

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].previous_address.as_deref(), Some("b"));
    assert_eq!(report.results[0].basis, DistanceBasis::SameCountry);
    assert_eq!(report.summary.skipped, 1);
}

fn lyon_city_only(address: &str, rtt: f64) -> Hop {
    let mut city_only = hop(address, Some(rtt), None, None);
    city_only.geolocation = Some(Geolocation {
        city: Some("Lyon".to_string()),
        region: None,
        country: None,
    });
    city_only
}

#[test]
fn unlocatable_hop_is_skipped_and_keeps_baseline() {
    let hops = vec![
        hop("a", Some(1.0), Some("FR"), Some((48.86, 2.35))),
        lyon_city_only("b", 2.0),
        hop("c", Some(30.0), Some("FR"), Some((43.30, 5.37))),
    ];
    let report = validate(&hops, &CountryDistanceMatrix::default());

    assert_eq!(report.audit.len(), 3);
    assert_eq!(report.summary.complete_hops, 2);
    assert_eq!(report.summary.skipped, 1);
    assert_eq!(report.results.len(), 1);
    let result = &report.results[0];
    assert_eq!(result.previous_address.as_deref(), Some("a"));
    assert_eq!(result.address.as_deref(), Some("c"));
    assert_eq!(result.basis, DistanceBasis::Coordinates);
    assert!(result.within_radius);
}

#[test]
fn unlocatable_hop_never_becomes_first_baseline() {
    let hops = vec![
        lyon_city_only("a", 1.0),
        hop("b", Some(2.0), Some("FR"), None),
        hop("c", Some(3.0), Some("FR"), None),
    ];
    let report = validate(&hops, &CountryDistanceMatrix::default());

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].previous_address.as_deref(), Some("b"));
}

#[test]
fn unlocatable_hop_drops_baseline_under_reset_policy() {
    let settings = ValidatorSettings {
        gap_policy: GapPolicy::ResetBaseline,
        ..ValidatorSettings::default()
    };
    let hops = vec![
        hop("a", Some(1.0), Some("FR"), None),
        lyon_city_only("b", 2.0),
        hop("c", Some(3.0), Some("FR"), None),
    ];
    let report = validate_with(&hops, &CountryDistanceMatrix::default(), &settings);

    assert!(report.results.is_empty());
    assert_eq!(report.summary.skipped, 1);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let table = matrix(&[("DE", "FR", 0.0), ("FR", "ES", 0.0)]);
    let hops = vec![
        hop("a", Some(1.0), Some("DE"), None),
        hop("b", None, None, None),
        hop("c", Some(4.0), Some("FR"), None),
        hop("d", Some(9.0), Some("ES"), Some((40.4, -3.7))),
    ];

    let first = serde_json::to_string(&validate(&hops, &table)).unwrap();
    let second = serde_json::to_string(&validate(&hops, &table)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn runs_keep_input_order_across_workers() {
    let runs: Vec<TraceRun> = (0..8)
        .map(|i| TraceRun {
            id: if i % 2 == 0 { Some(format!("msm-{i}")) } else { None },
            source: None,
            destination: None,
            start_time: Some(format!("2024-03-02T10:{i:02}:00Z")),
            end_time: None,
            hops: gap_sequence(),
        })
        .collect();
    let settings = ValidatorSettings {
        threads: 3,
        ..ValidatorSettings::default()
    };

    let reports = validate_runs(&runs, &CountryDistanceMatrix::default(), &settings).unwrap();
    let ids: Vec<&str> = reports.iter().map(|r| r.run_id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["msm-0", "run-1", "msm-2", "run-3", "msm-4", "run-5", "msm-6", "run-7"]
    );
    assert!(reports.iter().all(|r| r.report.results.len() == 1));
    assert_eq!(reports[5].start_time.as_deref(), Some("2024-03-02T10:05:00Z"));
    assert_eq!(reports[5].end_time, None);
}
