//! Error types for vfeval operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for vfeval operations.
///
/// Covers dimension mismatches between parallel dataset structures,
/// invalid hyperparameters, and dataset artifact problems.
///
/// # Examples
///
/// ```
/// use vfeval::error::VfError;
///
/// let err = VfError::DimensionMismatch {
///     expected: "100 samples".to_string(),
///     actual: "99 labels".to_string(),
/// };
/// assert!(err.to_string().contains("dimension mismatch"));
/// ```
#[derive(Debug)]
pub enum VfError {
    /// Parallel structures (features / segment info / labels) disagree in length.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Dataset artifact could not be parsed or failed shape validation.
    InvalidDataset {
        /// Error description
        message: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for VfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfError::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {expected}, got {actual}")
            }
            VfError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            VfError::InvalidDataset { message } => {
                write!(f, "invalid dataset: {message}")
            }
            VfError::Io(e) => write!(f, "I/O error: {e}"),
            VfError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for VfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VfError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for VfError {
    fn from(err: std::io::Error) -> Self {
        VfError::Io(err)
    }
}

impl From<serde_json::Error> for VfError {
    fn from(err: serde_json::Error) -> Self {
        VfError::InvalidDataset {
            message: err.to_string(),
        }
    }
}

impl From<&str> for VfError {
    fn from(msg: &str) -> Self {
        VfError::Other(msg.to_string())
    }
}

impl From<String> for VfError {
    fn from(msg: String) -> Self {
        VfError::Other(msg)
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, VfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_dimension_mismatch() {
        let err = VfError::DimensionMismatch {
            expected: "10 rows".to_string(),
            actual: "8 rows".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("10 rows"));
        assert!(msg.contains("8 rows"));
    }

    #[test]
    fn test_display_invalid_hyperparameter() {
        let err = VfError::InvalidHyperparameter {
            param: "n_estimators".to_string(),
            value: "0".to_string(),
            constraint: "a positive integer".to_string(),
        };
        assert!(err.to_string().contains("n_estimators"));
    }

    #[test]
    fn test_from_str() {
        let err: VfError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}
