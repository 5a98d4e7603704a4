//! Error types for wordspace.

use thiserror::Error;

/// Wordspace error types.
#[derive(Error, Debug)]
pub enum WordspaceError {
    /// An operation needs state (axes, consolidation, centers, a fitted
    /// model) that has not been produced yet.
    #[error("Precondition not met: {0}")]
    PreconditionNotMet(String),

    /// Malformed numeric range, branching specification or similar input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The item kind structurally lacks the requested relation
    #[error("Not applicable: {0}")]
    NotApplicable(String),

    /// Shapes of points, centers, coefficients or targets disagree
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Empty input where non-empty was required
    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Axis file could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for wordspace operations.
pub type Result<T> = std::result::Result<T, WordspaceError>;
