use crate::CoreError;

/// Every variable element is an `f64`; NaN marks "unset".
pub type Real = f64;

/// Absolute/relative pair used when comparing stored values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

/// Passes when either tolerance holds; NaN never compares equal.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let gap = (a - b).abs();
    gap <= tol.abs || gap <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(value: Real, what: &'static str) -> Result<Real, CoreError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::NonFinite { what, value })
    }
}

/// L2 norm of a residual vector.
pub fn norm2(values: &[Real]) -> Real {
    values.iter().fold(0.0, |acc, v| acc + v * v).sqrt()
}
