//! Offline builder for the country distance matrix.

use crate::distance::haversine_km;
use crate::error::GeoError;
use crate::geometry::{nearest_points, Boundary, FeatureCollection};
use crate::matrix::CountryDistanceMatrix;
use crate::names::{CountryDictionary, Resolution};
use geofloor_model::{CountryDistanceEntry, CountryExclusion};
use log::{info, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct BuildSettings {
    /// Worker threads; 0 uses the global rayon pool.
    pub threads: usize,
    /// Log progress every N pairs; 0 disables it.
    pub progress_every: usize,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            threads: 0,
            progress_every: 1000,
        }
    }
}

#[derive(Debug, Default)]
pub struct Reconciled {
    pub countries: BTreeMap<String, Boundary>,
    pub excluded: Vec<CountryExclusion>,
}

#[derive(Debug)]
pub struct MatrixBuild {
    pub matrix: CountryDistanceMatrix,
    pub countries: Vec<String>,
    pub excluded: Vec<CountryExclusion>,
}

/// Maps every feature to a dictionary code. Features that do not resolve, or
/// whose geometry is unusable, are excluded by name; nothing is guessed.
pub fn reconcile(collection: &FeatureCollection, dictionary: &CountryDictionary) -> Reconciled {
    let mut reconciled = Reconciled::default();

    for feature in &collection.features {
        let code = match dictionary.resolve(feature) {
            Resolution::Matched(code) => code,
            Resolution::Unmatched { name, reason } => {
                warn!("excluding {name:?}: {reason}");
                reconciled.excluded.push(CountryExclusion { name, reason });
                continue;
            }
        };

        let boundary = match feature.geometry.as_ref().map(Boundary::from_geometry) {
            Some(Ok(boundary)) => boundary,
            Some(Err(err)) => {
                warn!("excluding geometry of {code}: {err}");
                reconciled.excluded.push(CountryExclusion {
                    name: code,
                    reason: err.to_string(),
                });
                continue;
            }
            None => {
                warn!("excluding feature for {code}: missing geometry");
                reconciled.excluded.push(CountryExclusion {
                    name: code,
                    reason: "missing geometry".to_string(),
                });
                continue;
            }
        };

        reconciled
            .countries
            .entry(code)
            .or_default()
            .extend(boundary);
    }

    let empty: Vec<String> = reconciled
        .countries
        .iter()
        .filter(|(_, boundary)| boundary.is_empty())
        .map(|(code, _)| code.clone())
        .collect();
    for code in empty {
        warn!("excluding {code}: no usable polygon rings");
        reconciled.countries.remove(&code);
        reconciled.excluded.push(CountryExclusion {
            name: code,
            reason: "no usable polygon rings".to_string(),
        });
    }

    reconciled
}

/// Geodesic distance between the nearest boundary points of two countries.
pub fn pair_distance_km(a: &Boundary, b: &Boundary) -> Option<f64> {
    nearest_points(a, b).map(|(p, q)| haversine_km(p.to_coordinates(), q.to_coordinates()))
}

pub fn build_matrix(
    collection: &FeatureCollection,
    dictionary: &CountryDictionary,
    settings: &BuildSettings,
) -> Result<MatrixBuild, GeoError> {
    let Reconciled {
        countries,
        excluded,
    } = reconcile(collection, dictionary);

    let boundaries: Vec<(&String, &Boundary)> = countries.iter().collect();
    let pairs: Vec<(usize, usize)> = (0..boundaries.len())
        .flat_map(|i| ((i + 1)..boundaries.len()).map(move |j| (i, j)))
        .collect();

    info!(
        "computing {} country pairs across {} countries ({} excluded)",
        pairs.len(),
        boundaries.len(),
        excluded.len()
    );

    let total = pairs.len();
    let progress_every = settings.progress_every;
    let counter = AtomicUsize::new(0);
    let start = Instant::now();

    let distances: Vec<((usize, usize), Option<f64>)> = with_thread_pool(settings.threads, || {
        pairs
            .par_iter()
            .map(|&(i, j)| {
                let km = pair_distance_km(boundaries[i].1, boundaries[j].1);

                if progress_every > 0 {
                    let done = counter.fetch_add(1, Ordering::Relaxed) + 1;
                    if done == total || done % progress_every == 0 {
                        let elapsed = start.elapsed().as_secs_f64();
                        let percent = (done as f64 / total as f64) * 100.0;
                        info!(
                            "matrix: {}/{} pairs ({:.1}%) elapsed {:.1}s",
                            done, total, percent, elapsed
                        );
                    }
                }

                ((i, j), km)
            })
            .collect()
    })?;

    let mut entries = Vec::with_capacity(distances.len() * 2);
    for ((i, j), km) in distances {
        let (a, b) = (boundaries[i].0, boundaries[j].0);
        match km {
            Some(km) => {
                entries.push(CountryDistanceEntry {
                    from: a.clone(),
                    to: b.clone(),
                    km,
                });
                entries.push(CountryDistanceEntry {
                    from: b.clone(),
                    to: a.clone(),
                    km,
                });
            }
            None => warn!("no nearest points between {a} and {b}"),
        }
    }

    let matrix = CountryDistanceMatrix::from_entries(entries);
    let codes: Vec<String> = countries.keys().cloned().collect();

    let gaps = matrix.coverage_gaps(&codes);
    for (from, to) in &gaps {
        let gap = GeoError::UnknownCountryPair {
            from: from.clone(),
            to: to.clone(),
        };
        warn!("coverage gap: {gap}");
    }

    info!(
        "built country matrix: {} countries, {} ordered pairs, {} gaps in {:.1}s",
        codes.len(),
        matrix.len(),
        gaps.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(MatrixBuild {
        matrix,
        countries: codes,
        excluded,
    })
}

fn with_thread_pool<T: Send>(
    threads: usize,
    f: impl FnOnce() -> T + Send,
) -> Result<T, GeoError> {
    if threads == 0 {
        Ok(f())
    } else {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?
            .install(f))
    }
}
