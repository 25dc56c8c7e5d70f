//! Convergence reports.

use std::fmt;

use crate::config::NonlinearKind;

#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceReport {
    pub solver: NonlinearKind,
    pub converged: bool,
    /// Passes (NLBGS), Newton steps, or 1 for run-once.
    pub iterations: usize,
    pub residual_norm: f64,
    pub initial_norm: f64,
    /// State element with the largest final residual.
    pub worst_variable: Option<String>,
    pub worst_residual: f64,
}

impl ConvergenceReport {
    pub(crate) fn single_pass() -> Self {
        Self {
            solver: NonlinearKind::RunOnce,
            converged: true,
            iterations: 1,
            residual_norm: 0.0,
            initial_norm: 0.0,
            worst_variable: None,
            worst_residual: 0.0,
        }
    }
}

impl fmt::Display for ConvergenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.converged {
            "converged"
        } else {
            "did not converge"
        };
        write!(
            f,
            "{} {} after {} iteration(s), residual {:.3e}",
            self.solver, status, self.iterations, self.residual_norm
        )?;
        if let Some(name) = &self.worst_variable {
            write!(f, " (worst: {name} = {:.3e})", self.worst_residual)?;
        }
        Ok(())
    }
}

/// Index and absolute value of the largest residual element.
///
/// A `NaN` element counts as the worst.
pub(crate) fn worst_element(residual: &[f64]) -> Option<(usize, f64)> {
    residual
        .iter()
        .map(|r| if r.is_nan() { f64::INFINITY } else { r.abs() })
        .enumerate()
        .fold(None, |best, (i, r)| match best {
            Some((_, b)) if b >= r => best,
            _ => Some((i, r)),
        })
}
