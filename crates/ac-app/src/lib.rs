//! ac-app: configuration assembly and the coupled-system driver.
//!
//! Turns a validated [`ac_project::Config`] into an [`AssembledSystem`] of
//! groups and service leaves, and drives it through a [`Problem`]:
//!
//! - `setup()` builds the variable store and checks every connection
//! - `run_model()` evaluates the tree, iterating groups that carry a solver
//! - `run_driver()` optimizes over copies of the set-up system
//! - [`run_batch`] evaluates independent cases in parallel
//!
//! Snapshot services in [`io_service`] write the needed inputs, read user
//! values back and write every variable after a run.

pub mod assembler;
pub mod batch;
pub mod error;
pub mod io_service;
pub mod optimize;
pub mod problem;
pub mod system;

pub use assembler::{attach_solvers, build, solver_settings};
pub use batch::{
    BatchReport, Case, CaseFile, CaseOutcome, load_cases, run_batch, save_batch,
};
pub use error::{AppError, AppResult, SetupError};
pub use io_service::{
    ExtraVariable, output_snapshot, read_inputs, write_needed_inputs, write_outputs,
};
pub use optimize::{FEASIBILITY_TOLERANCE, OptimizationResult, PENALTY_WEIGHT};
pub use problem::{Problem, ProblemState, RunStatus};
pub use system::{AssembledSystem, Group, GroupReport, Leaf, Node, UNSET_SEED};
