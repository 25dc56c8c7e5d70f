//! Nonlinear block Gauss-Seidel.
//!
//! One pass evaluates every block once, in order; each block sees the outputs
//! already updated earlier in the pass. The residual of a pass is the change
//! of the coupling state across it.

use tracing::debug;

use crate::config::{NonlinearKind, SolverSettings};
use crate::error::SolverError;
use crate::report::{ConvergenceReport, worst_element};
use crate::system::BlockSystem;

/// Iterate passes until the residual norm satisfies the tolerances, at most
/// `max_iterations` passes.
///
/// Returns a report with `converged == false` when the cap is reached or the
/// residual becomes non-finite; only block failures are errors.
pub fn nlbgs_solve<S: BlockSystem>(
    system: &mut S,
    settings: &SolverSettings,
) -> Result<ConvergenceReport, S::Error> {
    settings.validate()?;

    let mut initial_norm = f64::NAN;
    let mut norm = f64::NAN;
    let mut residual = Vec::new();

    for pass in 1..=settings.max_iterations {
        let before = system.state();
        system.evaluate_all()?;
        let mut after = system.state();
        if after.len() != before.len() {
            return Err(SolverError::StateLength {
                expected: before.len(),
                actual: after.len(),
            }
            .into());
        }

        residual = after.iter().zip(&before).map(|(a, b)| a - b).collect();
        norm = ac_core::norm2(&residual);
        if pass == 1 {
            initial_norm = norm;
        }
        debug!(pass, residual = norm, "nlbgs pass");

        if settings.is_converged(norm, initial_norm) {
            return Ok(report(system, true, pass, norm, initial_norm, &residual));
        }
        if !norm.is_finite() {
            return Ok(report(system, false, pass, norm, initial_norm, &residual));
        }

        if settings.relaxation != 1.0 {
            for ((x, b), r) in after.iter_mut().zip(&before).zip(&residual) {
                *x = b + settings.relaxation * r;
            }
            system.set_state(&after)?;
        }
    }

    Ok(report(
        system,
        false,
        settings.max_iterations,
        norm,
        initial_norm,
        &residual,
    ))
}

fn report<S: BlockSystem>(
    system: &S,
    converged: bool,
    iterations: usize,
    norm: f64,
    initial_norm: f64,
    residual: &[f64],
) -> ConvergenceReport {
    let worst = worst_element(residual);
    ConvergenceReport {
        solver: NonlinearKind::Nlbgs,
        converged,
        iterations,
        residual_norm: norm,
        initial_norm,
        worst_variable: worst.map(|(i, _)| system.state_label(i)),
        worst_residual: worst.map_or(0.0, |(_, r)| r),
    }
}
