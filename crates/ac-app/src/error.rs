//! Error types for the ac-app service layer.

use std::path::PathBuf;

use ac_components::{ComponentError, RegistryError};
use ac_graph::GraphError;
use ac_project::ProjectError;
use ac_results::ResultsError;
use ac_solver::{ConvergenceReport, SolverError};

use crate::problem::ProblemState;

/// Why `setup()` refused a system.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("group '{group}' contains a cycle between {members:?} but has no iterative solver")]
    UnsolvedCycle { group: String, members: Vec<String> },
}

/// Application error type wrapping the backend crates with structured,
/// user-actionable payloads.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error at '{path}': {reason}")]
    ConfigurationAssembly { path: String, reason: String },

    #[error("Setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("Mandatory inputs are not set: {}", names.join(", "))]
    MissingInputs { names: Vec<String> },

    #[error("Input file not found: {path}")]
    MissingInputFile { path: PathBuf },

    #[error("Operation '{operation}' is not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: ProblemState,
    },

    #[error("Component '{component}' failed: {source}")]
    Discipline {
        component: String,
        #[source]
        source: ComponentError,
    },

    #[error("Group '{group}' did not converge: {report}")]
    NotConverged {
        group: String,
        report: Box<ConvergenceReport>,
    },

    #[error("Variable error: {0}")]
    Variable(#[from] GraphError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    #[error("Results error: {0}")]
    Results(#[from] ResultsError),

    #[error("No optimization problem is declared")]
    NoOptimization,

    #[error("Variable '{name}' must be a scalar here")]
    NotScalar { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ac-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub(crate) fn assembly(path: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::ConfigurationAssembly {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
