//! RTT floor test for traceroute hop geolocations.

pub mod error;
pub mod radius;
pub mod validator;

pub use error::ValidateError;
pub use radius::{estimate_radius, FIBER_SPEED_FACTOR, SPEED_OF_LIGHT_KM_PER_MS};
pub use validator::{
    validate, validate_with, Baseline, GapPolicy, HopChainValidator, ValidationState,
    ValidatorSettings,
};

use geofloor_geo::CountryDistanceMatrix;
use geofloor_model::{RunReport, TraceRun};
use log::info;
use rayon::prelude::*;

/// Validates every run with its own validator. Runs are spread over worker
/// threads; the matrix is only read. Output order follows input order.
pub fn validate_runs(
    runs: &[TraceRun],
    matrix: &CountryDistanceMatrix,
    settings: &ValidatorSettings,
) -> Result<Vec<RunReport>, ValidateError> {
    let work = || {
        runs.par_iter()
            .enumerate()
            .map(|(index, run)| {
                let run_id = run
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("run-{index}"));
                let report = validate_with(&run.hops, matrix, settings);
                info!(
                    "{}: {} hops, {} verdicts, {} outside radius, {} skipped",
                    run_id,
                    report.summary.hops,
                    report.summary.verdicts,
                    report.summary.violations,
                    report.summary.skipped
                );
                RunReport {
                    run_id,
                    start_time: run.start_time.clone(),
                    end_time: run.end_time.clone(),
                    report,
                }
            })
            .collect::<Vec<RunReport>>()
    };

    if settings.threads == 0 {
        Ok(work())
    } else {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(settings.threads)
            .build()?
            .install(work))
    }
}
