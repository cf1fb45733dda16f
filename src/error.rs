//! Error types for cardio-predict

use thiserror::Error;

/// Result type alias for cardio-predict operations
pub type Result<T> = std::result::Result<T, CardioError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum CardioError {
    /// Malformed or missing inputs. The caller has to fix them before retrying.
    #[error("Argument error: {0}")]
    ArgumentError(String),

    /// Incompatible scoring or model configuration.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CardioError {
    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        CardioError::ArgumentError(msg.into())
    }

    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        CardioError::ConfigurationError(msg.into())
    }

    /// True for errors caused by malformed or missing inputs
    pub fn is_argument_error(&self) -> bool {
        matches!(self, CardioError::ArgumentError(_))
    }

    /// True for errors caused by an incompatible scoring/model setup
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, CardioError::ConfigurationError(_))
    }
}

impl From<polars::error::PolarsError> for CardioError {
    fn from(err: polars::error::PolarsError) -> Self {
        CardioError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for CardioError {
    fn from(err: serde_json::Error) -> Self {
        CardioError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CardioError {
    fn from(err: ndarray::ShapeError) -> Self {
        CardioError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CardioError::ArgumentError("labels are required".to_string());
        assert_eq!(err.to_string(), "Argument error: labels are required");
    }

    #[test]
    fn test_error_kinds() {
        assert!(CardioError::argument("x").is_argument_error());
        assert!(!CardioError::argument("x").is_configuration_error());
        assert!(CardioError::configuration("x").is_configuration_error());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CardioError = io_err.into();
        assert!(matches!(err, CardioError::IoError(_)));
    }
}
