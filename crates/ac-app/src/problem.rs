//! Coupled-system driver: the lifecycle of one evaluation context.
//!
//! ```text
//! Unbuilt --setup--> Setup --run_model--> Converged | Failed
//!                    Setup --run_driver-> Optimizing -> Optimized | OptimizationFailed
//! ```
//!
//! `setup()` may be called from any state and starts over with a fresh store.

use std::fmt;
use std::path::Path;

use ac_components::ServiceRegistry;
use ac_core::Value;
use ac_graph::{ConnectionGraph, UnconnectedReport, VariableDescriptor};
use ac_project::{Config, OptimizationDef};
use tracing::{info, warn};

use crate::assembler::{attach_solvers, build};
use crate::error::{AppError, AppResult};
use crate::system::{AssembledSystem, GroupReport, evaluate_group};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemState {
    Unbuilt,
    Setup,
    Converged,
    Failed,
    Optimizing,
    Optimized,
    OptimizationFailed,
}

impl ProblemState {
    /// No mutation is allowed without a fresh `setup()`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProblemState::Converged
                | ProblemState::Failed
                | ProblemState::Optimized
                | ProblemState::OptimizationFailed
        )
    }
}

impl fmt::Display for ProblemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ProblemState::Unbuilt => "UNBUILT",
            ProblemState::Setup => "SETUP",
            ProblemState::Converged => "CONVERGED",
            ProblemState::Failed => "FAILED",
            ProblemState::Optimizing => "OPTIMIZING",
            ProblemState::Optimized => "OPTIMIZED",
            ProblemState::OptimizationFailed => "OPTIMIZATION_FAILED",
        };
        f.write_str(text)
    }
}

/// Outcome of `run_model()` when no error was raised.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Converged,
    /// A group reached its iteration cap (or a non-finite residual).
    Failed(GroupReport),
}

impl RunStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, RunStatus::Converged)
    }

    /// Turn a convergence failure into an error.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            RunStatus::Converged => Ok(()),
            RunStatus::Failed(failure) => Err(AppError::NotConverged {
                group: failure.group,
                report: Box::new(failure.report),
            }),
        }
    }
}

/// An assembled system plus its variable store and lifecycle state.
///
/// Cloning gives an independent evaluation context: disciplines are shared,
/// the store and the reports are copied.
#[derive(Debug, Clone)]
pub struct Problem {
    system: AssembledSystem,
    graph: Option<ConnectionGraph>,
    state: ProblemState,
    reports: Vec<GroupReport>,
    pub(crate) optimization: Option<OptimizationDef>,
}

impl Problem {
    pub fn new(system: AssembledSystem) -> Self {
        Self {
            system,
            graph: None,
            state: ProblemState::Unbuilt,
            reports: Vec::new(),
            optimization: None,
        }
    }

    /// Assemble the configuration's model tree and attach its solvers.
    pub fn from_config(config: &Config, registry: &mut ServiceRegistry) -> AppResult<Self> {
        let mut system = build(config, registry)?;
        attach_solvers(&mut system, config)?;
        Ok(Self {
            optimization: config.optimization.clone(),
            ..Self::new(system)
        })
    }

    /// Load a configuration file and assemble it.
    pub fn load(path: &Path, registry: &mut ServiceRegistry) -> AppResult<Self> {
        let config = ac_project::load_config(path)?;
        Self::from_config(&config, registry)
    }

    pub fn with_optimization(mut self, optimization: OptimizationDef) -> Self {
        self.optimization = Some(optimization);
        self
    }

    pub fn system(&self) -> &AssembledSystem {
        &self.system
    }

    pub fn state(&self) -> ProblemState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ProblemState) {
        self.state = state;
    }

    /// Reports of the iterated groups from the last run.
    pub fn reports(&self) -> &[GroupReport] {
        &self.reports
    }

    pub fn optimization(&self) -> Option<&OptimizationDef> {
        self.optimization.as_ref()
    }

    /// Build the store from the declarations and check the connections.
    pub fn setup(&mut self) -> AppResult<()> {
        self.reports.clear();
        match self.system.setup() {
            Ok(graph) => {
                self.graph = Some(graph);
                self.state = ProblemState::Setup;
                Ok(())
            }
            Err(e) => {
                self.graph = None;
                self.state = ProblemState::Unbuilt;
                Err(e.into())
            }
        }
    }

    /// Connection graph and store; available once set up.
    pub fn connections(&self) -> AppResult<&ConnectionGraph> {
        self.graph.as_ref().ok_or(AppError::InvalidState {
            operation: "read",
            state: self.state,
        })
    }

    pub(crate) fn replace_store_from(&mut self, other: Problem) {
        self.graph = other.graph;
        self.reports = other.reports;
    }

    pub fn get(&self, name: &str) -> AppResult<Value> {
        Ok(self.connections()?.store().get(name)?.value.clone())
    }

    pub fn get_in(&self, name: &str, units: &str) -> AppResult<Value> {
        Ok(self.connections()?.store().get_in(name, Some(units))?)
    }

    /// Scalar value, converted when `units` is given.
    pub fn get_scalar(&self, name: &str, units: Option<&str>) -> AppResult<f64> {
        self.connections()?
            .store()
            .get_in(name, units)?
            .as_scalar()
            .ok_or_else(|| AppError::NotScalar {
                name: name.to_string(),
            })
    }

    /// Overwrite a variable; only allowed right after `setup()`.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        units: Option<&str>,
    ) -> AppResult<()> {
        if self.state != ProblemState::Setup {
            return Err(AppError::InvalidState {
                operation: "set",
                state: self.state,
            });
        }
        let graph = self.graph.as_mut().ok_or(AppError::InvalidState {
            operation: "set",
            state: self.state,
        })?;
        graph.store_mut().set(name, value.into(), units)?;
        Ok(())
    }

    /// Unconnected inputs, with their declared defaults.
    pub fn unconnected(&self) -> AppResult<UnconnectedReport> {
        Ok(self.connections()?.unconnected())
    }

    /// Every variable with its current value, in declaration order.
    pub fn variables(&self) -> AppResult<Vec<VariableDescriptor>> {
        Ok(self
            .connections()?
            .store()
            .iter()
            .map(|e| e.descriptor())
            .collect())
    }

    /// Evaluate the root group.
    ///
    /// Fails fast with the complete list of mandatory inputs that are still
    /// unset. A group that does not converge moves the problem to `Failed`
    /// and is returned as [`RunStatus::Failed`]; discipline errors also move
    /// it to `Failed` and propagate.
    pub fn run_model(&mut self) -> AppResult<RunStatus> {
        if self.state != ProblemState::Setup {
            return Err(AppError::InvalidState {
                operation: "run_model",
                state: self.state,
            });
        }
        let graph = self.graph.as_mut().ok_or(AppError::InvalidState {
            operation: "run_model",
            state: self.state,
        })?;

        let missing = graph.store().missing_inputs();
        if !missing.is_empty() {
            return Err(AppError::MissingInputs { names: missing });
        }

        self.reports.clear();
        if let Err(e) = evaluate_group(self.system.root(), graph, &mut self.reports) {
            self.state = ProblemState::Failed;
            return Err(e);
        }

        let root = self.system.root().label();
        let failure = self
            .reports
            .iter()
            .find(|r| r.group == root && !r.report.converged)
            .or_else(|| self.reports.iter().find(|r| !r.report.converged));
        if let Some(failure) = failure {
            warn!(group = %failure.group, report = %failure.report, "model did not converge");
            let failure = failure.clone();
            self.state = ProblemState::Failed;
            return Ok(RunStatus::Failed(failure));
        }

        self.state = ProblemState::Converged;
        info!(groups = self.reports.len(), "model converged");
        Ok(RunStatus::Converged)
    }
}
