//! Read-only country-to-country minimum distance table.

use crate::error::GeoError;
use geofloor_model::{CountryDistanceEntry, CountryDistanceFile, CountryExclusion};
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub const MATRIX_FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default)]
pub struct CountryDistanceMatrix {
    distances: HashMap<String, HashMap<String, f64>>,
}

#[derive(Default)]
struct PairStats {
    km: f64,
    forward: bool,
    backward: bool,
}

impl CountryDistanceMatrix {
    /// Builds a symmetric table. One-directional entries are mirrored; when
    /// both directions are given and disagree the smaller distance is kept.
    /// Self-pairs and negative or non-finite distances are dropped.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = CountryDistanceEntry>,
    {
        let mut pairs: BTreeMap<(String, String), PairStats> = BTreeMap::new();

        for entry in entries {
            let from = entry.from.trim().to_ascii_uppercase();
            let to = entry.to.trim().to_ascii_uppercase();
            if from == to {
                warn!("ignoring self-pair distance entry for {from}");
                continue;
            }
            if !entry.km.is_finite() || entry.km < 0.0 {
                warn!("ignoring invalid distance {} for {from} -> {to}", entry.km);
                continue;
            }

            let forward = from < to;
            let key = if forward { (from, to) } else { (to, from) };
            let stats = pairs.entry(key).or_insert_with(|| PairStats {
                km: entry.km,
                ..PairStats::default()
            });

            if (stats.km - entry.km).abs() > 1e-9 {
                warn!(
                    "conflicting distances for {} / {}: {:.3} km vs {:.3} km, keeping the smaller",
                    entry.from,
                    entry.to,
                    stats.km,
                    entry.km
                );
                stats.km = stats.km.min(entry.km);
            }
            if forward {
                stats.forward = true;
            } else {
                stats.backward = true;
            }
        }

        let mut distances: HashMap<String, HashMap<String, f64>> = HashMap::new();
        let mut mirrored = 0usize;
        for ((a, b), stats) in pairs {
            if !(stats.forward && stats.backward) {
                mirrored += 1;
            }
            distances
                .entry(a.clone())
                .or_default()
                .insert(b.clone(), stats.km);
            distances.entry(b).or_default().insert(a, stats.km);
        }
        if mirrored > 0 {
            debug!("mirrored {mirrored} one-directional country distance entries");
        }

        Self { distances }
    }

    pub fn from_file(file: &CountryDistanceFile) -> Self {
        if file.version != MATRIX_FILE_VERSION {
            warn!(
                "country distance file version {} differs from expected {}",
                file.version, MATRIX_FILE_VERSION
            );
        }
        Self::from_entries(file.entries.iter().cloned())
    }

    /// Minimum border-to-border distance in km. Self-pairs are never stored.
    pub fn lookup(&self, from: &str, to: &str) -> Result<f64, GeoError> {
        self.distances
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .ok_or_else(|| GeoError::UnknownCountryPair {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    /// Number of ordered pairs.
    pub fn len(&self) -> usize {
        self.distances.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn countries(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.distances.keys().map(String::as_str).collect();
        set.into_iter().collect()
    }

    /// Ordered pairs among `codes` that have no entry.
    pub fn coverage_gaps(&self, codes: &[String]) -> Vec<(String, String)> {
        let mut gaps = Vec::new();
        for from in codes {
            for to in codes {
                if from != to && self.lookup(from, to).is_err() {
                    gaps.push((from.clone(), to.clone()));
                }
            }
        }
        gaps
    }

    /// Entries sorted by `(from, to)`, both directions included.
    pub fn entries(&self) -> Vec<CountryDistanceEntry> {
        let mut entries: Vec<CountryDistanceEntry> = self
            .distances
            .iter()
            .flat_map(|(from, row)| {
                row.iter().map(move |(to, km)| CountryDistanceEntry {
                    from: from.clone(),
                    to: to.clone(),
                    km: *km,
                })
            })
            .collect();
        entries.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        entries
    }

    pub fn to_file(
        &self,
        generated_at_utc: String,
        excluded: Vec<CountryExclusion>,
    ) -> CountryDistanceFile {
        CountryDistanceFile {
            version: MATRIX_FILE_VERSION,
            generated_at_utc,
            entries: self.entries(),
            excluded,
        }
    }
}
