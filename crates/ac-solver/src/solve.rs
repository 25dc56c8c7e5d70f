//! High-level solver interface.

use crate::config::{NonlinearKind, SolverSettings};
use crate::gauss_seidel::nlbgs_solve;
use crate::newton::newton_solve;
use crate::report::ConvergenceReport;
use crate::system::BlockSystem;

/// Converge `system` with the configured nonlinear strategy.
///
/// Block failures propagate as errors; non-convergence is reported through
/// `ConvergenceReport::converged`.
pub fn solve<S: BlockSystem>(
    system: &mut S,
    settings: &SolverSettings,
) -> Result<ConvergenceReport, S::Error> {
    match settings.nonlinear {
        NonlinearKind::RunOnce => {
            system.evaluate_all()?;
            Ok(ConvergenceReport::single_pass())
        }
        NonlinearKind::Nlbgs => nlbgs_solve(system, settings),
        NonlinearKind::Newton => newton_solve(system, settings),
    }
}
