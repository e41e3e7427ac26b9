//! Error types for qamatch.
//!
//! This module defines a unified error enum that covers configuration, I/O,
//! catalog/index consistency and embedding provider failures.

use thiserror::Error;

/// Unified error type for qamatch.
///
/// All fallible functions return `Result<T, AppError>`.
/// Startup errors (everything except `ProviderUnavailable`) abort loading;
/// nothing is served from a partially loaded catalog.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog build and load errors that have no dedicated variant
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// An index or catalog was built from zero entries
    #[error("Catalog is empty: at least one question/answer pair is required")]
    EmptyCatalog,

    /// A vector does not have the dimension the index was built with
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A persisted index could not be decoded
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// The persisted index and catalog do not belong together
    #[error("Catalog mismatch: {0}")]
    CatalogMismatch(String),

    /// The embedding provider could not produce a vector
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the error only affects the current request.
    ///
    /// Everything else is a startup error.
    pub fn is_per_request(&self) -> bool {
        matches!(self, AppError::ProviderUnavailable(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = AppError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 384, got 768");
    }

    #[test]
    fn test_only_provider_errors_are_per_request() {
        assert!(AppError::ProviderUnavailable("down".to_string()).is_per_request());
        assert!(!AppError::EmptyCatalog.is_per_request());
        assert!(!AppError::CorruptIndex("bad magic".to_string()).is_per_request());
    }

    #[test]
    fn test_from_serde_json() {
        let err: AppError = serde_json::from_str::<Vec<u32>>("not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
