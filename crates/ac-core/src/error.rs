use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

/// Lowest common denominator the backend errors can be folded into.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("{what} is not finite ({value})")]
    NonFinite { what: &'static str, value: f64 },

    #[error("bad argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("{what}: index {index} outside 0..{len}")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{what} has shape {actual}, expected {expected}")]
    ShapeMismatch {
        what: String,
        expected: String,
        actual: String,
    },

    #[error("internal inconsistency: {what}")]
    Invariant { what: &'static str },
}
