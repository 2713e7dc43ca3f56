use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationReport;

/// The main error type for grapeset operations.
#[derive(Debug, Error)]
pub enum GrapesetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse collection JSON from {path}: {source}")]
    CollectionJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write collection JSON to {path}: {source}")]
    CollectionJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write label map to {path}: {source}")]
    LabelMapWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write box CSV to {path}: {source}")]
    BoxCsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Label parse error in {path} at line {line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Invalid image dimensions for {path}: {message}")]
    ImageDimensionInvalid { path: PathBuf, message: String },

    #[error("Failed to read mask archive {path}: {source}")]
    MaskArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid mask array in {path}: {message}")]
    MaskFormat { path: PathBuf, message: String },

    #[error("Failed to encode mask PNG {path}: {source}")]
    MaskEncode {
        path: PathBuf,
        #[source]
        source: png::EncodingError,
    },

    #[error("Invalid dataset layout at {path}: {message}")]
    LayoutInvalid { path: PathBuf, message: String },

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[source] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported split: {0}")]
    UnsupportedSplit(String),

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}
