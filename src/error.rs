//! Error types for listdist operations.

use thiserror::Error;

/// Result type alias using [`DistanceError`].
pub type Result<T> = std::result::Result<T, DistanceError>;

/// Error types for listdist operations.
///
/// Every variant is structural and is raised before a batch is evaluated.
/// Data-dependent edge cases (null rows, empty lists, zero magnitudes) are
/// absorbed into the output as nulls or NaN instead.
#[derive(Debug, Error)]
pub enum DistanceError {
    // ==================== Bind-time Errors ====================
    /// No algorithm is registered under the requested name.
    #[error("Unknown distance algorithm '{name}'")]
    UnknownAlgorithm { name: String },

    /// The algorithm name argument was not a constant string.
    #[error("Distance algorithm name must be a constant: {0}")]
    NonConstantAlgorithmName(String),

    /// An algorithm or alias with this name already exists.
    #[error("Distance algorithm '{0}' is already registered")]
    DuplicateAlgorithm(String),

    // ==================== Input Errors ====================
    /// Type mismatch errors.
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    /// Malformed argument (wrong query cardinality, etc.).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Engine configuration rejected by validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error raised by an Arrow kernel (casts, array construction).
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl DistanceError {
    /// Builds a [`DistanceError::TypeError`] from anything displayable.
    pub(crate) fn type_error(expected: impl Into<String>, actual: impl std::fmt::Debug) -> Self {
        DistanceError::TypeError {
            expected: expected.into(),
            actual: format!("{actual:?}"),
        }
    }
}
