use std::path::PathBuf;
use thiserror::Error;

use crate::export::ExportReport;
use crate::validation::ValidationReport;

/// The main error type for boxmark operations.
#[derive(Debug, Error)]
pub enum BoxmarkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse document JSON from {path}: {source}")]
    DocumentParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write document JSON to {path}: {source}")]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse class list from {path}: {source}")]
    ClassListParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to scan directory {path}: {message}")]
    DirectoryScan { path: PathBuf, message: String },

    #[error("Document has no file path; save it before scanning or exporting")]
    NoDocumentPath,

    #[error("Label '{0}' already exists")]
    LabelExists(String),

    #[error("Label '{0}' not found")]
    LabelNotFound(String),

    #[error("Image '{0}' is not tracked by the document")]
    ImageNotFound(String),

    #[error("Invalid color '{0}' (expected #rrggbb)")]
    InvalidColor(String),

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Export finished with {failure_count} failure(s) and {warning_count} warning(s)")]
    ExportFailed {
        failure_count: usize,
        warning_count: usize,
        report: ExportReport,
    },
}
