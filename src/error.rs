//! Error types for differential expression and enrichment analysis

use thiserror::Error;

/// Main error type for analysis operations
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Invalid count matrix: {reason}")]
    InvalidCountMatrix { reason: String },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: String, got: String },

    #[error("Size factor estimation failed: {reason}")]
    SizeFactorFailed { reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Empty data: {reason}")]
    EmptyData { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
}

/// Result type alias for analysis operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// Outcome of a pipeline stage that may legitimately have nothing to report.
///
/// An empty significant-gene set, zero mapped identifiers, or zero enriched
/// categories are successful terminal states, distinct from both errors and
/// empty output files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// The stage produced results.
    Completed,
    /// The stage had nothing to report.
    Skipped { reason: String },
}

impl StageStatus {
    pub fn skipped(reason: impl Into<String>) -> Self {
        StageStatus::Skipped { reason: reason.into() }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StageStatus::Skipped { .. })
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageStatus::Completed => write!(f, "completed"),
            StageStatus::Skipped { reason } => write!(f, "skipped: {}", reason),
        }
    }
}
