//! Shared data structures for geofloor.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceFile {
    pub version: u32,
    pub runs: Vec<TraceRun>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceRun {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    pub hops: Vec<Hop>,
}

/// One responding (or silent) node of a traceroute, as handed over by the
/// ingestion side. Every field is optional; see [`Hop::is_complete`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Hop {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rtt: Option<f64>,
    #[serde(default)]
    pub geolocation: Option<Geolocation>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub rdns: Option<String>,
}

impl Hop {
    /// RTT in milliseconds, if it is a usable sample.
    pub fn rtt_ms(&self) -> Option<f64> {
        self.rtt.filter(|rtt| rtt.is_finite() && *rtt >= 0.0)
    }

    /// A hop without a usable RTT, without any geolocation field, or whose
    /// geolocation cannot be placed never takes part in a distance or radius
    /// computation.
    pub fn is_complete(&self) -> bool {
        self.rtt_ms().is_some()
            && self
                .geolocation
                .as_ref()
                .is_some_and(|geo| !geo.is_empty())
            && self.is_locatable()
    }

    /// Valid coordinates or a country code; a city or region alone is not enough.
    pub fn is_locatable(&self) -> bool {
        self.resolved_coordinates().is_some() || self.country_code().is_some()
    }

    pub fn resolved_coordinates(&self) -> Option<Coordinates> {
        self.coordinates.filter(Coordinates::is_valid)
    }

    pub fn country_code(&self) -> Option<String> {
        self.geolocation.as_ref().and_then(Geolocation::country_code)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Geolocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, alias = "state")]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Geolocation {
    pub fn city(&self) -> Option<&str> {
        present(&self.city)
    }

    pub fn region(&self) -> Option<&str> {
        present(&self.region)
    }

    /// Upper-cased country code, or `None` when the provider left it blank.
    pub fn country_code(&self) -> Option<String> {
        present(&self.country).map(|code| code.to_ascii_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.city().is_none() && self.region().is_none() && self.country_code().is_none()
    }
}

// Upstream tooling writes missing fields as "None" rather than omitting them.
fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != "None")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Raw copy of an input hop, kept whether or not it produced a verdict.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub address: Option<String>,
    pub rtt: Option<f64>,
    pub geolocation: Option<Geolocation>,
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub rdns: Option<String>,
}

impl From<&Hop> for AuditRecord {
    fn from(hop: &Hop) -> Self {
        Self {
            address: hop.address.clone(),
            rtt: hop.rtt,
            geolocation: hop.geolocation.clone(),
            coordinates: hop.coordinates,
            rdns: hop.rdns.clone(),
        }
    }
}

/// Where the distance of a verdict came from. `SameCountry` marks the
/// co-location approximation (distance 0).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBasis {
    Coordinates,
    CountryMatrix,
    SameCountry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloorTestResult {
    pub address: Option<String>,
    pub previous_address: Option<String>,
    pub rtt: f64,
    pub geolocation: Option<Geolocation>,
    pub computed_distance_km: f64,
    pub radius_km: f64,
    pub within_radius: bool,
    pub basis: DistanceBasis,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationSummary {
    pub hops: u32,
    pub complete_hops: u32,
    pub verdicts: u32,
    pub violations: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub audit: Vec<AuditRecord>,
    pub results: Vec<FloorTestResult>,
    pub summary: ValidationSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportFile {
    pub version: u32,
    pub reports: Vec<RunReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub run_id: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    pub report: ValidationReport,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryDistanceFile {
    pub version: u32,
    pub generated_at_utc: String,
    pub entries: Vec<CountryDistanceEntry>,
    #[serde(default)]
    pub excluded: Vec<CountryExclusion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryDistanceEntry {
    pub from: String,
    pub to: String,
    pub km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryExclusion {
    pub name: String,
    pub reason: String,
}
