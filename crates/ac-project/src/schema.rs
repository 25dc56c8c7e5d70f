//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Schema version written by this crate.
pub const CONFIG_VERSION: u32 = 1;

/// Free-form options handed to a service factory.
pub type OptionsDef = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    /// Solver of the root group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverDef>,
    pub model: ModelNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationDef>,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// One node of the model tree: a leaf (has `service`) or a group (has `children`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: OptionsDef,
    /// When false, variables declared beneath this node are prefixed with `<name>.`.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub promotes: bool,
    /// Local variable name -> global name. Leaves only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ModelNode>,
}

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

impl ModelNode {
    /// Group node with the given children.
    pub fn group(name: impl Into<String>, children: Vec<ModelNode>) -> Self {
        Self {
            name: name.into(),
            service: None,
            implementation: None,
            options: OptionsDef::new(),
            promotes: true,
            aliases: BTreeMap::new(),
            solver: None,
            children,
        }
    }

    /// Leaf node resolving `service` with its default implementation.
    pub fn leaf(name: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            service: Some(service.into()),
            ..Self::group(name, Vec::new())
        }
    }

    pub fn implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = Some(implementation.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn alias(mut self, local: impl Into<String>, global: impl Into<String>) -> Self {
        self.aliases.insert(local.into(), global.into());
        self
    }

    pub fn solver(mut self, solver: SolverDef) -> Self {
        self.solver = Some(solver);
        self
    }

    pub fn unpromoted(mut self) -> Self {
        self.promotes = false;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.service.is_some()
    }
}

/// Solver block; unset fields take the solver defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonlinear: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linear: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relaxation: Option<f64>,
    /// `forward` or `central` (Newton Jacobian).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fd_scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fd_step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_search_beta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_line_search_iters: Option<usize>,
}

impl SolverDef {
    pub fn nonlinear(kind: impl Into<String>) -> Self {
        Self {
            nonlinear: Some(kind.into()),
            ..Self::default()
        }
    }

    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationDef {
    #[serde(default)]
    pub driver: DriverDef,
    pub design_variables: Vec<DesignVariableDef>,
    pub objective: ObjectiveDef,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintDef>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    #[default]
    NelderMead,
    Gradient,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverDef {
    #[serde(default)]
    pub kind: DriverKind,
    #[serde(default = "default_driver_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_driver_tolerance")]
    pub tolerance: f64,
}

fn default_driver_iterations() -> usize {
    200
}

fn default_driver_tolerance() -> f64 {
    1e-6
}

impl Default for DriverDef {
    fn default() -> Self {
        Self {
            kind: DriverKind::default(),
            max_iterations: default_driver_iterations(),
            tolerance: default_driver_tolerance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesignVariableDef {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    /// Starting point; the current store value when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObjectiveDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub maximize: bool,
    #[serde(default = "default_scaler")]
    pub scaler: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

fn default_scaler() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConstraintDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}
