//! Error types for solver operations.

use ac_core::CoreError;
use thiserror::Error;

/// Errors raised by the solvers themselves.
///
/// Failures of a block evaluation are reported through the block system's
/// own error type, which must accept these via `From`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid solver settings: {what}")]
    InvalidSettings { what: String },

    #[error("Linear solve failed: {what}")]
    LinearSolve { what: &'static str },

    #[error("State length mismatch: expected {expected}, got {actual}")]
    StateLength { expected: usize, actual: usize },

    #[error("Numeric error: {what}")]
    Numeric { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for CoreError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::InvalidSettings { .. } => CoreError::InvalidArg {
                what: "solver settings",
            },
            SolverError::LinearSolve { what } => CoreError::InvalidArg { what },
            SolverError::StateLength { expected, actual } => CoreError::IndexOob {
                what: "solver state",
                index: actual,
                len: expected,
            },
            SolverError::Numeric { .. } => CoreError::InvalidArg { what: "numeric" },
        }
    }
}
