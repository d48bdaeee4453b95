use geofloor_geo::GeoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidateError {
    /// One of the two RTT samples is absent.
    #[error("missing RTT sample, radius cannot be bounded")]
    MissingRtt,

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
