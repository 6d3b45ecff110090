//! Crate-wide error type.

use thiserror::Error;

/// Errors surfaced by dataset loading, model persistence, spec validation,
/// and training setup.
#[derive(Debug, Error)]
pub enum KilnError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("invalid network spec: {0}")]
    InvalidSpec(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
