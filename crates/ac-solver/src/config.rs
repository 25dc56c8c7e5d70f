//! Solver settings.

use std::fmt;
use std::str::FromStr;

use crate::error::{SolverError, SolverResult};

/// Nonlinear strategy applied to the children of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonlinearKind {
    /// Evaluate every block once, in order.
    RunOnce,
    /// Nonlinear block Gauss-Seidel.
    #[default]
    Nlbgs,
    /// Newton on `G(x) - x` with a finite-difference Jacobian.
    Newton,
}

impl NonlinearKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NonlinearKind::RunOnce => "run_once",
            NonlinearKind::Nlbgs => "nlbgs",
            NonlinearKind::Newton => "newton",
        }
    }
}

impl fmt::Display for NonlinearKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NonlinearKind {
    type Err = SolverError;

    fn from_str(s: &str) -> SolverResult<Self> {
        match s {
            "run_once" => Ok(NonlinearKind::RunOnce),
            "nlbgs" | "gauss_seidel" => Ok(NonlinearKind::Nlbgs),
            "newton" => Ok(NonlinearKind::Newton),
            other => Err(SolverError::InvalidSettings {
                what: format!("unknown nonlinear solver '{other}'"),
            }),
        }
    }
}

/// Linear solver used inside Newton steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinearKind {
    /// Dense LU factorization.
    #[default]
    Direct,
    /// SVD least squares; tolerates singular Jacobians.
    Svd,
}

impl LinearKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LinearKind::Direct => "direct",
            LinearKind::Svd => "svd",
        }
    }
}

impl fmt::Display for LinearKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinearKind {
    type Err = SolverError;

    fn from_str(s: &str) -> SolverResult<Self> {
        match s {
            "direct" | "lu" => Ok(LinearKind::Direct),
            "svd" => Ok(LinearKind::Svd),
            other => Err(SolverError::InvalidSettings {
                what: format!("unknown linear solver '{other}'"),
            }),
        }
    }
}

/// Finite-difference scheme for Jacobians.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FdScheme {
    #[default]
    Forward,
    /// Twice the evaluations, second-order accurate.
    Central,
}

impl FromStr for FdScheme {
    type Err = SolverError;

    fn from_str(s: &str) -> SolverResult<Self> {
        match s {
            "forward" => Ok(FdScheme::Forward),
            "central" => Ok(FdScheme::Central),
            other => Err(SolverError::InvalidSettings {
                what: format!("unknown finite-difference scheme '{other}'"),
            }),
        }
    }
}

/// Solver configuration for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    pub nonlinear: NonlinearKind,
    pub linear: LinearKind,
    /// Maximum passes (NLBGS) or Newton steps.
    pub max_iterations: usize,
    /// Absolute tolerance on the residual norm
    pub atol: f64,
    /// Tolerance on the residual norm relative to the first one
    pub rtol: f64,
    /// NLBGS under/over-relaxation factor in (0, 2)
    pub relaxation: f64,
    /// Relative step for finite differences
    pub fd_step: f64,
    pub fd_scheme: FdScheme,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            nonlinear: NonlinearKind::Nlbgs,
            linear: LinearKind::Direct,
            max_iterations: 50,
            atol: 1e-10,
            rtol: 1e-10,
            relaxation: 1.0,
            fd_step: 1e-7,
            fd_scheme: FdScheme::Forward,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
        }
    }
}

impl SolverSettings {
    pub fn run_once() -> Self {
        Self {
            nonlinear: NonlinearKind::RunOnce,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> SolverResult<()> {
        let invalid = |what: &str| {
            Err(SolverError::InvalidSettings {
                what: what.to_string(),
            })
        };
        if self.max_iterations == 0 {
            return invalid("max_iterations must be at least 1");
        }
        if !(self.atol >= 0.0 && self.rtol >= 0.0) {
            return invalid("tolerances must be non-negative");
        }
        if !(self.relaxation > 0.0 && self.relaxation < 2.0) {
            return invalid("relaxation must be in (0, 2)");
        }
        if !(self.fd_step > 0.0) {
            return invalid("fd_step must be positive");
        }
        if !(self.line_search_beta > 0.0 && self.line_search_beta < 1.0) {
            return invalid("line_search_beta must be in (0, 1)");
        }
        if self.max_line_search_iters == 0 {
            return invalid("max_line_search_iters must be at least 1");
        }
        Ok(())
    }

    /// Residual norm test shared by every iterative solver.
    pub fn is_converged(&self, norm: f64, initial_norm: f64) -> bool {
        norm < self.atol || norm < self.rtol * initial_norm
    }
}
