//! Error types for the network engines

use lsnn_core::SnnError;
use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors raised while building or stepping spiking networks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Error from the core primitives
    #[error("Core error: {0}")]
    Core(#[from] SnnError),

    /// Construction-time mismatch between weight tensor and layer sizes
    #[error("Invalid topology: {reason}")]
    InvalidTopology {
        /// Reason for invalid topology
        reason: String,
    },

    /// Step-time input length mismatch against the input layer
    #[error("Expected input length is {expected}: found {found}")]
    InvalidInput {
        /// Expected input count
        expected: usize,
        /// Actual input count
        found: usize,
    },
}

impl RuntimeError {
    /// Create an invalid topology error
    pub fn invalid_topology(reason: impl Into<String>) -> Self {
        Self::InvalidTopology {
            reason: reason.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(expected: usize, found: usize) -> Self {
        Self::InvalidInput { expected, found }
    }
}
