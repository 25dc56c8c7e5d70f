//! Assembled system: a tree of groups and service leaves over one flat
//! variable store, and its evaluation.
//!
//! Groups without an iterative solver run their children once, in document
//! order. Groups with one hand their children to `ac_solver` as blocks; the
//! coupling state is every value produced beneath the group.

use std::fmt;
use std::sync::Arc;

use ac_components::{Discipline, Inputs, Outputs};
use ac_core::{CompId, Value, VarId};
use ac_graph::{ConnectionBuilder, ConnectionGraph, VarRole, VariableSpec};
use ac_solver::{BlockSystem, ConvergenceReport, NonlinearKind, SolverError, SolverSettings};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, SetupError};

/// Value given to unset coupling variables before a group is iterated.
pub const UNSET_SEED: f64 = 1.0;

#[derive(Clone)]
pub struct Leaf {
    pub name: String,
    /// Dotted path from the root (root name excluded).
    pub path: String,
    /// Key path of the node in the configuration document.
    pub config_path: String,
    pub service_id: String,
    pub implementation_id: String,
    pub discipline: Arc<dyn Discipline>,
    /// Declarations under their resolved global names.
    pub variables: Vec<VariableSpec>,
    /// Name the discipline itself uses for each entry of `variables`.
    pub locals: Vec<String>,
    pub comp: CompId,
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Leaf")
            .field("path", &self.path)
            .field("service_id", &self.service_id)
            .field("implementation_id", &self.implementation_id)
            .field("comp", &self.comp)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub path: String,
    pub config_path: String,
    /// Nonlinear solver iterating the children; `None` runs them once.
    pub solver: Option<SolverSettings>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Group(Group),
    Leaf(Leaf),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Group(g) => &g.name,
            Node::Leaf(l) => &l.name,
        }
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Leaf>) {
        match self {
            Node::Leaf(leaf) => out.push(leaf),
            Node::Group(group) => {
                for child in &group.children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    fn leaf_comps(&self) -> Vec<CompId> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves.iter().map(|l| l.comp).collect()
    }
}

impl Group {
    /// Path for messages; the root group is reported by name.
    pub fn label(&self) -> &str {
        if self.path.is_empty() {
            &self.name
        } else {
            &self.path
        }
    }

    /// Leaves beneath this group, in document order.
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        for child in &self.children {
            child.collect_leaves(&mut out);
        }
        out
    }

    pub fn leaf_comps(&self) -> Vec<CompId> {
        self.leaves().iter().map(|l| l.comp).collect()
    }

    /// This group and every nested group, depth first.
    pub fn groups(&self) -> Vec<&Group> {
        let mut out = vec![self];
        for child in &self.children {
            if let Node::Group(g) = child {
                out.extend(g.groups());
            }
        }
        out
    }

    pub fn is_iterative(&self) -> bool {
        self.solver
            .as_ref()
            .is_some_and(|s| s.nonlinear != NonlinearKind::RunOnce)
    }
}

/// Last convergence report of one iterated group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub group: String,
    pub report: ConvergenceReport,
}

/// Tree built by the assembler. Disciplines are shared; cloning is cheap.
#[derive(Debug, Clone)]
pub struct AssembledSystem {
    root: Group,
}

impl AssembledSystem {
    pub(crate) fn new(root: Group) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Group {
        &mut self.root
    }

    pub fn leaves(&self) -> Vec<&Leaf> {
        self.root.leaves()
    }

    /// Materialize the store and validate the connections.
    ///
    /// Fails on duplicate outputs and metadata conflicts, and when a group
    /// has a cycle among its children but no iterative solver.
    pub fn setup(&self) -> Result<ConnectionGraph, SetupError> {
        let mut builder = ConnectionBuilder::new();
        for leaf in self.leaves() {
            let comp = builder.add_component(&leaf.path, leaf.variables.clone());
            debug_assert_eq!(comp, leaf.comp);
        }
        let graph = builder.build()?;

        for group in self.root.groups() {
            let blocks: Vec<Vec<CompId>> = group.children.iter().map(Node::leaf_comps).collect();
            let cycles = graph.block_cycles(&blocks);
            let Some(first) = cycles.first() else {
                continue;
            };
            let members: Vec<String> = first
                .iter()
                .map(|&b| group.children[b].name().to_string())
                .collect();
            if !group.is_iterative() {
                return Err(SetupError::UnsolvedCycle {
                    group: group.label().to_string(),
                    members,
                });
            }
            debug!(group = group.label(), ?members, "coupled children");
        }

        info!(
            leaves = self.leaves().len(),
            variables = graph.store().len(),
            "system set up"
        );
        Ok(graph)
    }
}

fn record(reports: &mut Vec<GroupReport>, group: &str, report: ConvergenceReport) {
    match reports.iter_mut().find(|r| r.group == group) {
        Some(existing) => existing.report = report,
        None => reports.push(GroupReport {
            group: group.to_string(),
            report,
        }),
    }
}

pub(crate) fn evaluate_group(
    group: &Group,
    graph: &mut ConnectionGraph,
    reports: &mut Vec<GroupReport>,
) -> AppResult<()> {
    let settings = match &group.solver {
        Some(settings) if group.is_iterative() => settings,
        _ => {
            for child in &group.children {
                evaluate_node(child, graph, reports)?;
            }
            return Ok(());
        }
    };

    let report = {
        let mut system = GroupSystem::new(group, graph, reports);
        system.seed_unset()?;
        ac_solver::solve(&mut system, settings)?
    };
    if report.converged {
        debug!(group = group.label(), %report, "group converged");
    } else {
        warn!(group = group.label(), %report, "group did not converge");
    }
    record(reports, group.label(), report);
    Ok(())
}

fn evaluate_node(
    node: &Node,
    graph: &mut ConnectionGraph,
    reports: &mut Vec<GroupReport>,
) -> AppResult<()> {
    match node {
        Node::Group(group) => evaluate_group(group, graph, reports),
        Node::Leaf(leaf) => evaluate_leaf(leaf, graph),
    }
}

fn evaluate_leaf(leaf: &Leaf, graph: &mut ConnectionGraph) -> AppResult<()> {
    let bindings = graph.bindings(leaf.comp);
    let store = graph.store();

    let mut inputs = Inputs::new();
    let mut outputs = Outputs::new();
    for (binding, local) in bindings.iter().zip(&leaf.locals) {
        let value = store.read_as(binding.var, binding.units.as_deref())?;
        match binding.role {
            VarRole::Input => inputs.insert(local.clone(), value),
            VarRole::Output => outputs.declare(local.clone(), value),
        }
    }

    leaf.discipline
        .compute(&inputs, &mut outputs)
        .map_err(|source| AppError::Discipline {
            component: leaf.path.clone(),
            source,
        })?;

    let writes: Vec<(VarId, Value, Option<String>)> = bindings
        .iter()
        .zip(&leaf.locals)
        .filter(|(b, _)| b.role == VarRole::Output)
        .filter_map(|(b, local)| {
            outputs
                .get(local)
                .map(|v| (b.var, v.clone(), b.units.clone()))
        })
        .collect();

    let store = graph.store_mut();
    for (var, value, units) in writes {
        store.write_from(var, value, units.as_deref())?;
    }
    Ok(())
}

/// Children of one group seen as solver blocks.
struct GroupSystem<'a> {
    group: &'a Group,
    graph: &'a mut ConnectionGraph,
    reports: &'a mut Vec<GroupReport>,
    state_vars: Vec<VarId>,
    labels: Vec<String>,
}

impl<'a> GroupSystem<'a> {
    fn new(
        group: &'a Group,
        graph: &'a mut ConnectionGraph,
        reports: &'a mut Vec<GroupReport>,
    ) -> Self {
        let state_vars = graph.outputs_of(&group.leaf_comps());
        let mut labels = Vec::new();
        for &var in &state_vars {
            let entry = graph.store().entry(var);
            match entry.value {
                Value::Scalar(_) => labels.push(entry.name.clone()),
                Value::Array(ref values) => {
                    labels.extend((0..values.len()).map(|i| format!("{}[{i}]", entry.name)));
                }
            }
        }
        Self {
            group,
            graph,
            reports,
            state_vars,
            labels,
        }
    }

    /// Replace unset coupling elements so the first residual is finite.
    fn seed_unset(&mut self) -> AppResult<()> {
        let store = self.graph.store_mut();
        for &var in &self.state_vars {
            let value = store.value(var);
            if value.has_unset() {
                let seeded = value.map(|v| if v.is_nan() { UNSET_SEED } else { v });
                debug!(variable = %store.entry(var).name, "seeding unset coupling value");
                store.write(var, seeded)?;
            }
        }
        Ok(())
    }
}

impl BlockSystem for GroupSystem<'_> {
    type Error = AppError;

    fn block_count(&self) -> usize {
        self.group.children.len()
    }

    fn evaluate_block(&mut self, index: usize) -> AppResult<()> {
        evaluate_node(&self.group.children[index], self.graph, self.reports)
    }

    fn state(&self) -> Vec<f64> {
        let store = self.graph.store();
        self.state_vars
            .iter()
            .flat_map(|&var| store.value(var).as_slice().iter().copied())
            .collect()
    }

    fn set_state(&mut self, x: &[f64]) -> AppResult<()> {
        if x.len() != self.labels.len() {
            return Err(SolverError::StateLength {
                expected: self.labels.len(),
                actual: x.len(),
            }
            .into());
        }
        let store = self.graph.store_mut();
        let mut offset = 0;
        for &var in &self.state_vars {
            let value = match store.value(var) {
                Value::Scalar(_) => Value::Scalar(x[offset]),
                Value::Array(values) => Value::Array(x[offset..offset + values.len()].to_vec()),
            };
            offset += value.len();
            store.write(var, value)?;
        }
        Ok(())
    }

    fn state_label(&self, index: usize) -> String {
        self.labels.get(index).cloned().unwrap_or_default()
    }
}
