//! Error handling and error types for the surrogate crate.
//!
//! All fallible operations return [`Result`]. There are no retries anywhere
//! in the crate: validation, training and storage failures are fatal to the
//! calling operation and must be handled by the caller.

use std::io;
use thiserror::Error;

/// Main error type for the surrogate library.
///
/// Covers configuration validation, dataset handling, training, prediction
/// and model persistence. Errors raised by the underlying fitting and
/// splitting routines are surfaced unchanged through these variants.
#[derive(Error, Debug)]
pub enum SurrogateError {
    /// Configuration and parameter validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Dataset-related errors (malformed tables, missing columns)
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// Data dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Feature encoding errors (unknown category, non-numeric column)
    #[error("Feature processing error: {message}")]
    FeatureProcessing { message: String },

    /// Training-related errors
    #[error("Training error: {message}")]
    Training { message: String },

    /// Prediction errors
    #[error("Prediction error: {message}")]
    Prediction { message: String },

    /// Model serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Bincode serialization errors
    #[error("Bincode error: {source}")]
    Bincode {
        #[from]
        source: bincode::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
}

/// Type alias for Results using SurrogateError
pub type Result<T> = std::result::Result<T, SurrogateError>;

impl SurrogateError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        SurrogateError::Config {
            message: message.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        SurrogateError::Dataset {
            message: message.into(),
        }
    }

    /// Create a feature processing error
    pub fn feature_processing<S: Into<String>>(message: S) -> Self {
        SurrogateError::FeatureProcessing {
            message: message.into(),
        }
    }

    /// Create a training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        SurrogateError::Training {
            message: message.into(),
        }
    }

    /// Create a prediction error
    pub fn prediction<S: Into<String>>(message: S) -> Self {
        SurrogateError::Prediction {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        SurrogateError::Serialization {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        SurrogateError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        SurrogateError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            SurrogateError::Config { .. } => "config",
            SurrogateError::Dataset { .. } => "dataset",
            SurrogateError::DimensionMismatch { .. } => "dimension_mismatch",
            SurrogateError::FeatureProcessing { .. } => "feature_processing",
            SurrogateError::Training { .. } => "training",
            SurrogateError::Prediction { .. } => "prediction",
            SurrogateError::Serialization { .. } => "serialization",
            SurrogateError::Io { .. } => "io",
            SurrogateError::Bincode { .. } => "bincode",
            SurrogateError::Json { .. } => "json",
            SurrogateError::InvalidParameter { .. } => "invalid_parameter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SurrogateError::config("test configuration error");
        assert_eq!(err.category(), "config");

        let err = SurrogateError::training("test training error");
        assert_eq!(err.category(), "training");
    }

    #[test]
    fn test_parameter_errors() {
        let err = SurrogateError::invalid_parameter("test_size", "1.5", "must be in [0, 1)");
        assert_eq!(err.category(), "invalid_parameter");
        let display = format!("{}", err);
        assert!(display.contains("test_size"));
        assert!(display.contains("1.5"));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = SurrogateError::dimension_mismatch("1000 rows", "998 rows");
        assert_eq!(err.category(), "dimension_mismatch");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: SurrogateError = io_err.into();
        assert!(matches!(err, SurrogateError::Io { .. }));
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn test_error_display() {
        let err = SurrogateError::dataset("missing column 'epoch'");
        let error_string = format!("{}", err);
        assert!(error_string.contains("Dataset error"));
        assert!(error_string.contains("epoch"));
    }
}
