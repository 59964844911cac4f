//! Error types for the core primitives

use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, SnnError>;

/// Errors raised while building or configuring core components
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnnError {
    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Malformed configuration specification
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Reason for invalid configuration
        reason: String,
    },
}

impl SnnError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SnnError::invalid_parameter("lambda_decay", "-1", ">= 0.0");
        assert!(matches!(err, SnnError::InvalidParameter { .. }));

        let err = SnnError::invalid_config("unknown neuron kind");
        assert!(matches!(err, SnnError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = SnnError::invalid_parameter("frequency", "0", "> 0.0");
        let msg = format!("{}", err);
        assert!(msg.contains("frequency"));
        assert!(msg.contains("> 0.0"));
    }
}
