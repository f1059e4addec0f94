//! Error types for geodex operations.

use thiserror::Error;

/// Errors surfaced by the query pipeline.
///
/// Malformed records are recoverable by design: `add` and `load` report them
/// through this type so batch ingestion can skip bad documents without
/// aborting. The index itself never errors for well-formed rectangles;
/// structural corruption is a programming fault and trips debug assertions
/// instead of surfacing here.
#[derive(Error, Debug)]
pub enum GeodexError {
    /// Geometry missing, unconvertible, or without computable bounds.
    #[error("malformed geometry: {0}")]
    MalformedGeometry(String),

    /// GeoJSON payload could not be converted into geometry.
    #[error("invalid GeoJSON: {0}")]
    Geojson(#[from] geojson::Error),
}

/// Result type for geodex operations.
pub type Result<T> = std::result::Result<T, GeodexError>;
