//! Error types for Montage.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for Montage operations.
#[derive(Error, Debug)]
pub enum MontageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid range: in {in_point}s, out {out_point}s on a {duration}s source")]
    InvalidRange {
        in_point: f64,
        out_point: f64,
        duration: f64,
    },

    #[error("invalid effect parameter: {0}")]
    InvalidEffect(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("no item with id {0}")]
    NotFound(Uuid),

    #[error("source media missing: {0}")]
    MissingSource(String),

    #[error("probe failure for {path}: {reason}")]
    Probe { path: String, reason: String },

    #[error("decode failure in segment {segment}: {reason}")]
    Decode { segment: Uuid, reason: String },

    #[error("encode failure: {0}")]
    Encode(String),

    #[error("font unavailable: {0}")]
    Font(String),

    #[error("an export is already in progress")]
    ExportInProgress,

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for Montage operations.
pub type Result<T> = std::result::Result<T, MontageError>;
