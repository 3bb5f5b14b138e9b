use thiserror::Error;

use crate::algorithms::OutlineMode;

#[derive(Error, Debug)]
pub enum RoiError {
    #[error("Invalid margin: {0}")]
    InvalidMargin(String),

    #[error("Invalid canvas geometry: {0}")]
    InvalidCanvas(String),

    #[error("Slice index out of range: z={z}, c={c}, t={t}")]
    SliceOutOfRange { z: usize, c: usize, t: usize },

    #[error("Unable to outline region {index} with {mode}: {reason}")]
    Outline {
        index: usize,
        mode: OutlineMode,
        reason: String,
    },

    #[error("Operation not supported for {kind} regions: {operation}")]
    UnsupportedKind { kind: String, operation: String },

    #[error("Geometric computation error: {0}")]
    GeometricComputation(String),

    #[error("Invalid region archive: {0}")]
    Archive(String),

    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

pub type Result<T> = std::result::Result<T, RoiError>;
