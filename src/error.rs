//! Error types for packing runs.
//!
//! Only structural input problems are errors. A carton that does not fit is a
//! normal outcome reported in the step stream, and cancellation is a terminal
//! state, not a failure.

use thiserror::Error;

use crate::model::ValidationError;

/// Result type alias for packing operations.
pub type Result<T> = std::result::Result<T, PackError>;

/// Errors detected when a run is started. No step runs after one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackError {
    /// Container dimensions are non-positive or the interior does not fit inside the walls.
    #[error("Invalid container: {0}")]
    InvalidContainer(ValidationError),

    /// A request line has a zero quantity or an invalid carton dimension.
    #[error("Invalid request line {line}: {reason}")]
    InvalidRequest { line: usize, reason: ValidationError },

    /// The run is not in the state the operation requires.
    #[error("Run is {0}, expected idle")]
    NotIdle(&'static str),
}

impl PackError {
    /// Stable machine-readable code, used by the HTTP adapter.
    pub fn code(&self) -> &'static str {
        match self {
            PackError::InvalidContainer(_) => "invalid_container",
            PackError::InvalidRequest { .. } => "invalid_request",
            PackError::NotIdle(_) => "not_idle",
        }
    }
}
