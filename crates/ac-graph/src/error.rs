//! Graph-specific error types.

use ac_core::{CoreError, Shape, UnitError};
use thiserror::Error;

pub type GraphResult<T> = Result<T, GraphError>;

/// Variable declaration and connection errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Two components declare the same variable as output.
    #[error("Variable '{name}' is declared as output by both '{first}' and '{second}'")]
    DuplicateOutput {
        name: String,
        first: String,
        second: String,
    },

    /// Lookup of a name that no component declared.
    #[error("Unknown variable '{name}'")]
    UnknownVariable { name: String },

    /// A unit string outside the vocabulary.
    #[error("Variable '{name}' ({component}) has invalid units: {source}")]
    InvalidUnits {
        name: String,
        component: String,
        #[source]
        source: UnitError,
    },

    /// Two declarations (or a declaration and a write) use non-convertible units.
    #[error("Variable '{name}': units '{requested}' are not convertible to declared '{declared}'")]
    IncompatibleUnits {
        name: String,
        declared: String,
        requested: String,
    },

    /// Two declarations (or a declaration and a write) disagree on shape.
    #[error("Variable '{name}': expected shape {expected}, got {actual}")]
    ShapeConflict {
        name: String,
        expected: Shape,
        actual: Shape,
    },

    /// A component id that the graph does not know.
    #[error("Component {index} not found")]
    UnknownComponent { index: usize },
}

impl GraphError {
    pub(crate) fn incompatible(
        name: &str,
        declared: Option<&str>,
        requested: Option<&str>,
    ) -> Self {
        GraphError::IncompatibleUnits {
            name: name.to_string(),
            declared: declared.unwrap_or("None").to_string(),
            requested: requested.unwrap_or("None").to_string(),
        }
    }
}

impl From<GraphError> for CoreError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::ShapeConflict {
                name,
                expected,
                actual,
            } => CoreError::ShapeMismatch {
                what: name,
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
            _ => CoreError::Invariant {
                what: "variable graph",
            },
        }
    }
}
