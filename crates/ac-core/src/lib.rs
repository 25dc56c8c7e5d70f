//! ac-core: stable foundation for aerocouple.
//!
//! Contains:
//! - units (unit vocabulary, dimensions and conversions backed by uom)
//! - value (scalar/array variable values with the NaN "unset" sentinel)
//! - numeric (Real + tolerances + float helpers)
//! - ids (dense handles for leaf components and store entries)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;
pub mod value;

pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use units::{Dimension, Unit, UnitConverter, UnitError, UnitResult, convert, converter};
pub use value::{Shape, Value};

/// Separator between namespace segments of a variable name (`data:geometry:wing:area`).
pub const NAME_SEPARATOR: char = ':';

/// Separator between system path segments (`sizing_loop.weight`).
pub const PATH_SEPARATOR: char = '.';
