//! Newton solver on the fixed-point residual `F(x) = G(x) - x`.
//!
//! `G` is one Gauss-Seidel pass over the blocks starting from state `x`; the
//! Jacobian of `F` is built by finite differences and solved densely.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::config::{LinearKind, NonlinearKind, SolverSettings};
use crate::error::SolverError;
use crate::jacobian::jacobian;
use crate::report::{ConvergenceReport, worst_element};
use crate::system::BlockSystem;

/// Evaluate `F(x) = G(x) - x`; leaves the system at state `G(x)`.
fn fixed_point_residual<S: BlockSystem>(
    system: &mut S,
    x: &DVector<f64>,
) -> Result<DVector<f64>, S::Error> {
    system.set_state(x.as_slice())?;
    system.evaluate_all()?;
    let g = system.state();
    if g.len() != x.len() {
        return Err(SolverError::StateLength {
            expected: x.len(),
            actual: g.len(),
        }
        .into());
    }
    Ok(DVector::from_vec(g) - x)
}

fn linear_solve(
    kind: LinearKind,
    jac: DMatrix<f64>,
    rhs: &DVector<f64>,
) -> Result<DVector<f64>, SolverError> {
    match kind {
        LinearKind::Direct => jac.lu().solve(rhs).ok_or(SolverError::LinearSolve {
            what: "singular Jacobian",
        }),
        LinearKind::Svd => jac
            .svd(true, true)
            .solve(rhs, 1e-12)
            .map_err(|_| SolverError::LinearSolve {
                what: "SVD solve failed",
            }),
    }
}

/// Newton iteration with backtracking line search.
///
/// Non-convergence within `max_iterations` steps is reported, not raised.
pub fn newton_solve<S: BlockSystem>(
    system: &mut S,
    settings: &SolverSettings,
) -> Result<ConvergenceReport, S::Error> {
    settings.validate()?;

    let mut x = DVector::from_vec(system.state());
    let mut r = fixed_point_residual(system, &x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    for iter in 0..settings.max_iterations {
        debug!(iteration = iter, residual = r_norm, "newton step");
        if settings.is_converged(r_norm, r0_norm) {
            return Ok(report(system, true, iter, r_norm, r0_norm, &r));
        }
        if !r_norm.is_finite() {
            return Ok(report(system, false, iter, r_norm, r0_norm, &r));
        }

        let jac = jacobian(
            settings.fd_scheme,
            &x,
            &r,
            |xp: &DVector<f64>| fixed_point_residual(system, xp),
            settings.fd_step,
        )?;

        // Solve J * dx = -r
        let dx = linear_solve(settings.linear, jac, &(-r.clone()))?;

        let mut alpha = 1.0;
        let mut x_new = &x + alpha * &dx;
        let mut r_new = fixed_point_residual(system, &x_new)?;
        let mut r_new_norm = r_new.norm();

        for _ in 0..settings.max_line_search_iters {
            if r_new_norm < r_norm {
                break;
            }
            alpha *= settings.line_search_beta;
            x_new = &x + alpha * &dx;
            r_new = fixed_point_residual(system, &x_new)?;
            r_new_norm = r_new.norm();
        }

        x = x_new;
        r = r_new;
        r_norm = r_new_norm;
    }

    let converged = settings.is_converged(r_norm, r0_norm);
    Ok(report(system, converged, settings.max_iterations, r_norm, r0_norm, &r))
}

fn report<S: BlockSystem>(
    system: &S,
    converged: bool,
    iterations: usize,
    norm: f64,
    initial_norm: f64,
    residual: &DVector<f64>,
) -> ConvergenceReport {
    let worst = worst_element(residual.as_slice());
    ConvergenceReport {
        solver: NonlinearKind::Newton,
        converged,
        iterations,
        residual_norm: norm,
        initial_norm,
        worst_variable: worst.map(|(i, _)| system.state_label(i)),
        worst_residual: worst.map_or(0.0, |(_, r)| r),
    }
}
