//! Sequential floor test over the hops of one traceroute.

use crate::error::ValidateError;
use crate::radius::estimate_radius;
use geofloor_geo::{distance_between, CountryDistanceMatrix, GeoError};
use geofloor_model::{AuditRecord, FloorTestResult, Geolocation, Hop, ValidationReport};
use log::{debug, warn};

/// What an incomplete hop does to the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GapPolicy {
    /// Skip the hop; the last complete hop stays the comparison point.
    #[default]
    KeepBaseline,
    /// Drop the baseline; the next complete hop starts a fresh chain.
    ResetBaseline,
}

#[derive(Debug, Clone, Default)]
pub struct ValidatorSettings {
    pub gap_policy: GapPolicy,
    /// Worker threads for [`crate::validate_runs`]; 0 uses the global pool.
    pub threads: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    hop: Hop,
}

impl Baseline {
    /// Keeps only what later comparisons read: position, country and RTT.
    fn from_hop(hop: &Hop) -> Self {
        let geolocation = hop.geolocation.as_ref().map(country_only);
        Self {
            hop: Hop {
                address: hop.address.clone(),
                rtt: hop.rtt_ms(),
                geolocation,
                coordinates: hop.resolved_coordinates(),
                rdns: None,
            },
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.hop.address.as_deref()
    }

    pub fn rtt(&self) -> Option<f64> {
        self.hop.rtt
    }

    pub fn hop(&self) -> &Hop {
        &self.hop
    }
}

fn country_only(geo: &Geolocation) -> Geolocation {
    Geolocation {
        city: None,
        region: None,
        country: geo.country_code(),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ValidationState {
    #[default]
    NoBaseline,
    HasBaseline(Baseline),
}

/// Scan state for a single traceroute. Not shared between traceroutes; use
/// one instance per hop sequence.
pub struct HopChainValidator<'m> {
    matrix: &'m CountryDistanceMatrix,
    settings: ValidatorSettings,
    state: ValidationState,
    report: ValidationReport,
}

impl<'m> HopChainValidator<'m> {
    pub fn new(matrix: &'m CountryDistanceMatrix, settings: ValidatorSettings) -> Self {
        Self {
            matrix,
            settings,
            state: ValidationState::NoBaseline,
            report: ValidationReport::default(),
        }
    }

    pub fn state(&self) -> &ValidationState {
        &self.state
    }

    /// Feeds the next hop in arrival order and returns its verdict, if any.
    pub fn step(&mut self, hop: &Hop) -> Option<FloorTestResult> {
        self.report.audit.push(AuditRecord::from(hop));
        self.report.summary.hops += 1;

        if !hop.is_complete() {
            debug!(
                "hop {}: incomplete or unlocatable, no verdict",
                label(hop.address.as_deref())
            );
            self.report.summary.skipped += 1;
            if self.settings.gap_policy == GapPolicy::ResetBaseline {
                self.state = ValidationState::NoBaseline;
            }
            return None;
        }
        self.report.summary.complete_hops += 1;

        // The current hop is the next baseline whether or not a verdict follows.
        let previous = std::mem::replace(
            &mut self.state,
            ValidationState::HasBaseline(Baseline::from_hop(hop)),
        );
        let previous = match previous {
            ValidationState::NoBaseline => {
                debug!("hop {}: first baseline", label(hop.address.as_deref()));
                return None;
            }
            ValidationState::HasBaseline(baseline) => baseline,
        };

        match self.compare(&previous, hop) {
            Ok(result) => {
                self.report.summary.verdicts += 1;
                if !result.within_radius {
                    self.report.summary.violations += 1;
                    warn!(
                        "possible geolocation mis-mapping at {}: {:.1} km from {} exceeds {:.1} km radius",
                        label(result.address.as_deref()),
                        result.computed_distance_km,
                        label(result.previous_address.as_deref()),
                        result.radius_km
                    );
                }
                self.report.results.push(result.clone());
                Some(result)
            }
            Err(err) => {
                match &err {
                    ValidateError::Geo(GeoError::UnknownCountryPair { .. }) => {
                        warn!("hop {}: {err}", label(hop.address.as_deref()))
                    }
                    _ => debug!("hop {}: {err}", label(hop.address.as_deref())),
                }
                self.report.summary.skipped += 1;
                None
            }
        }
    }

    fn compare(&self, previous: &Baseline, hop: &Hop) -> Result<FloorTestResult, ValidateError> {
        let distance = distance_between(previous.hop(), hop, self.matrix)?;
        let radius = estimate_radius(hop.rtt_ms(), previous.rtt())?;

        Ok(FloorTestResult {
            address: hop.address.clone(),
            previous_address: previous.hop.address.clone(),
            rtt: hop.rtt_ms().ok_or(ValidateError::MissingRtt)?,
            geolocation: hop.geolocation.clone(),
            computed_distance_km: distance.km,
            radius_km: radius,
            // Inclusive: sitting exactly on the bound is plausible.
            within_radius: distance.km <= radius,
            basis: distance.basis,
        })
    }

    pub fn finish(self) -> ValidationReport {
        self.report
    }
}

fn label(address: Option<&str>) -> &str {
    address.unwrap_or("<no address>")
}

pub fn validate(hops: &[Hop], matrix: &CountryDistanceMatrix) -> ValidationReport {
    validate_with(hops, matrix, &ValidatorSettings::default())
}

pub fn validate_with(
    hops: &[Hop],
    matrix: &CountryDistanceMatrix,
    settings: &ValidatorSettings,
) -> ValidationReport {
    let mut validator = HopChainValidator::new(matrix, settings.clone());
    for hop in hops {
        validator.step(hop);
    }
    validator.finish()
}
