//! Nonlinear solvers for coupled block systems.
//!
//! A [`BlockSystem`] is an ordered list of blocks sharing a coupling state
//! (the values the blocks produce). The solvers drive it to a fixed point:
//! run-once, nonlinear block Gauss-Seidel with optional relaxation, or Newton
//! on `G(x) - x` with a finite-difference Jacobian and a dense linear solve.

pub mod config;
pub mod error;
pub mod gauss_seidel;
pub mod jacobian;
pub mod newton;
pub mod report;
pub mod solve;
pub mod system;

pub use config::{FdScheme, LinearKind, NonlinearKind, SolverSettings};
pub use error::{SolverError, SolverResult};
pub use gauss_seidel::nlbgs_solve;
pub use newton::newton_solve;
pub use report::ConvergenceReport;
pub use solve::solve;
pub use system::BlockSystem;
