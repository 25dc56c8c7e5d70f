//! Finite difference Jacobian computation.

use crate::config::FdScheme;
use nalgebra::{DMatrix, DVector};

/// Compute Jacobian using forward finite differences.
///
/// For each column j, perturbs x[j] by epsilon and computes (f(x+e) - f(x))/epsilon.
/// `f_x` is f evaluated at `x`, reused to save one evaluation.
pub fn finite_difference_jacobian<F, E>(
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    mut f: F,
    epsilon: f64,
) -> Result<DMatrix<f64>, E>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
{
    let n = x.len();
    let m = f_x.len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let mut x_perturbed = x.clone();
        let dx = epsilon * x[j].abs().max(1.0);
        x_perturbed[j] += dx;

        let f_perturbed = f(&x_perturbed)?;
        let df = (f_perturbed - f_x) / dx;
        jac.set_column(j, &df);
    }

    Ok(jac)
}

/// Compute Jacobian using central finite differences (more accurate but 2x cost).
pub fn central_difference_jacobian<F, E>(
    x: &DVector<f64>,
    m: usize,
    mut f: F,
    epsilon: f64,
) -> Result<DMatrix<f64>, E>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
{
    let n = x.len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);

        let mut x_plus = x.clone();
        x_plus[j] += dx;
        let f_plus = f(&x_plus)?;

        let mut x_minus = x.clone();
        x_minus[j] -= dx;
        let f_minus = f(&x_minus)?;

        let df = (f_plus - f_minus) / (2.0 * dx);
        jac.set_column(j, &df);
    }

    Ok(jac)
}

/// Jacobian with the configured scheme.
pub fn jacobian<F, E>(
    scheme: FdScheme,
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> Result<DMatrix<f64>, E>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
{
    match scheme {
        FdScheme::Forward => finite_difference_jacobian(x, f_x, f, epsilon),
        FdScheme::Central => central_difference_jacobian(x, f_x.len(), f, epsilon),
    }
}
