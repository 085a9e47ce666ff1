//! Error types
//!
//! Configuration and registration failures. Test-method failures are not
//! errors at this level; see [`crate::framework::Failure`].

use thiserror::Error;

/// Errors surfaced synchronously to the caller
#[derive(Error, Debug)]
pub enum DisttestError {
    #[error("Definition '{name}' does not satisfy the test-case contract: {reason}")]
    TypeConstraint { name: String, reason: String },

    #[error("Definition '{0}' is already registered")]
    DuplicateDefinition(String),

    #[error("Worker count must be positive, got {0}")]
    InvalidWorkerCount(usize),

    #[error("Timeout must be a positive duration")]
    InvalidTimeout,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DisttestError {
    pub(crate) fn type_constraint(name: impl Into<String>, reason: impl Into<String>) -> Self {
        DisttestError::TypeConstraint {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for the disttest crate
pub type Result<T> = std::result::Result<T, DisttestError>;
