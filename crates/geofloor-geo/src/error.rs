use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    /// Neither coordinates nor a country code resolve for this hop.
    #[error("no usable location for hop {address}")]
    NoLocation { address: String },

    /// The matrix has no entry for the pair; a coverage gap.
    #[error("no country distance for pair {from} -> {to}")]
    UnknownCountryPair { from: String, to: String },

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
