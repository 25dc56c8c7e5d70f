//! Connection resolution: producers, consumers, unconnected inputs and cycles.

use std::collections::BTreeSet;

use ac_core::{CompId, VarId};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::builder::ComponentIo;
use crate::error::{GraphError, GraphResult};
use crate::store::{Declarer, VariableStore};
use crate::variable::{VarRole, VariableDescriptor};

/// Where one declared variable of a component lives in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub var: VarId,
    pub role: VarRole,
    pub units: Option<String>,
}

/// Unconnected inputs, split by default availability.
///
/// Order follows first declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnconnectedReport {
    /// Every element of the default is `NaN`: the user must supply a value.
    pub mandatory: Vec<VariableDescriptor>,
    /// A usable default exists and will be used silently.
    pub optional: Vec<VariableDescriptor>,
}

impl UnconnectedReport {
    pub fn is_empty(&self) -> bool {
        self.mandatory.is_empty() && self.optional.is_empty()
    }

    /// Mandatory entries first, then optional ones.
    pub fn all(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.mandatory.iter().chain(self.optional.iter())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all().any(|d| d.name == name)
    }
}

/// Validated variable graph of one assembled system.
///
/// Owns the flat [`VariableStore`]; dependency edges run from the producing
/// component to every consuming component of a variable.
#[derive(Debug, Clone)]
pub struct ConnectionGraph {
    components: Vec<ComponentIo>,
    bindings: Vec<Vec<Binding>>,
    store: VariableStore,
    deps: DiGraph<CompId, VarId>,
}

impl ConnectionGraph {
    pub(crate) fn from_components(components: Vec<ComponentIo>) -> GraphResult<Self> {
        let mut store = VariableStore::new();
        let mut bindings = Vec::with_capacity(components.len());

        for comp in &components {
            let mut comp_bindings = Vec::with_capacity(comp.variables.len());
            for spec in &comp.variables {
                let var = store.register(comp.id, &comp.name, spec)?;
                comp_bindings.push(Binding {
                    var,
                    role: spec.role,
                    units: spec.units.clone(),
                });
            }
            bindings.push(comp_bindings);
        }

        let mut deps = DiGraph::with_capacity(components.len(), store.len());
        let nodes: Vec<NodeIndex> = components.iter().map(|c| deps.add_node(c.id)).collect();
        for entry in store.iter() {
            if let Some(producer) = &entry.producer {
                for consumer in &entry.consumers {
                    deps.add_edge(
                        nodes[producer.comp.slot()],
                        nodes[consumer.comp.slot()],
                        entry.id,
                    );
                }
            }
        }

        debug!(
            components = components.len(),
            variables = store.len(),
            edges = deps.edge_count(),
            "connection graph built"
        );

        Ok(Self {
            components,
            bindings,
            store,
            deps,
        })
    }

    pub fn components(&self) -> &[ComponentIo] {
        &self.components
    }

    pub fn component(&self, id: CompId) -> GraphResult<&ComponentIo> {
        self.components
            .get(id.slot())
            .ok_or(GraphError::UnknownComponent { index: id.slot() })
    }

    /// Store bindings of a component, in declaration order.
    pub fn bindings(&self, id: CompId) -> &[Binding] {
        self.bindings.get(id.slot()).map_or(&[], Vec::as_slice)
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    pub fn producer_of(&self, name: &str) -> GraphResult<Option<&Declarer>> {
        Ok(self.store.get(name)?.producer.as_ref())
    }

    pub fn consumers_of(&self, name: &str) -> GraphResult<&[Declarer]> {
        Ok(&self.store.get(name)?.consumers)
    }

    /// Classify every input that no component produces.
    ///
    /// Pure introspection of declared metadata: uses reconciled declared
    /// defaults, not values set since.
    pub fn unconnected(&self) -> UnconnectedReport {
        let (mandatory, optional) = self.store.unconnected();
        UnconnectedReport {
            mandatory,
            optional,
        }
    }

    /// Variables produced by any of `comps`, in store order.
    pub fn outputs_of(&self, comps: &[CompId]) -> Vec<VarId> {
        let set: BTreeSet<CompId> = comps.iter().copied().collect();
        self.store
            .iter()
            .filter(|e| e.producer.as_ref().is_some_and(|p| set.contains(&p.comp)))
            .map(|e| e.id)
            .collect()
    }

    /// Component sets forming dependency cycles (including self-feedback).
    pub fn cycles(&self) -> Vec<Vec<CompId>> {
        let blocks: Vec<Vec<CompId>> = self.components.iter().map(|c| vec![c.id]).collect();
        self.block_cycles(&blocks)
            .into_iter()
            .map(|scc| scc.into_iter().map(|b| blocks[b][0]).collect())
            .collect()
    }

    /// Cycles between blocks of components (children of one group).
    ///
    /// Edges internal to a block are ignored unless the block is a single
    /// component feeding itself. Returns block indices, sorted, per cycle.
    pub fn block_cycles(&self, blocks: &[Vec<CompId>]) -> Vec<Vec<usize>> {
        let mut block_of = vec![None; self.components.len()];
        for (b, members) in blocks.iter().enumerate() {
            for comp in members {
                if let Some(slot) = block_of.get_mut(comp.slot()) {
                    *slot = Some(b);
                }
            }
        }

        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(blocks.len(), 0);
        let nodes: Vec<NodeIndex> = (0..blocks.len()).map(|b| graph.add_node(b)).collect();
        let mut self_loops = BTreeSet::new();

        for edge in self.deps.raw_edges() {
            let from = self.deps[edge.source()];
            let to = self.deps[edge.target()];
            let (Some(bf), Some(bt)) = (block_of[from.slot()], block_of[to.slot()]) else {
                continue;
            };
            if bf != bt {
                graph.update_edge(nodes[bf], nodes[bt], ());
            } else if from == to && blocks[bf].len() == 1 {
                self_loops.insert(bf);
            }
        }

        let mut cycles: Vec<Vec<usize>> = tarjan_scc(&graph)
            .into_iter()
            .filter_map(|scc| {
                let mut members: Vec<usize> = scc.into_iter().map(|n| graph[n]).collect();
                members.sort_unstable();
                let cyclic = members.len() > 1 || self_loops.contains(&members[0]);
                cyclic.then_some(members)
            })
            .collect();
        cycles.sort();
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ConnectionBuilder;
    use crate::variable::VariableSpec;

    #[test]
    fn unconnected_classification() {
        let mut builder = ConnectionBuilder::new();
        builder.add_component(
            "leaf",
            vec![
                VariableSpec::input("x"),
                VariableSpec::input("y").default(0.0),
                VariableSpec::output("z"),
            ],
        );
        let graph = builder.build().unwrap();
        let report = graph.unconnected();
        let mandatory: Vec<&str> = report.mandatory.iter().map(|d| d.name.as_str()).collect();
        let optional: Vec<&str> = report.optional.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(mandatory, ["x"]);
        assert_eq!(optional, ["y"]);
        assert!(!report.contains("z"));
    }

    #[test]
    fn connected_inputs_are_not_reported() {
        let mut builder = ConnectionBuilder::new();
        builder.add_component("a", vec![VariableSpec::output("x")]);
        builder.add_component("b", vec![VariableSpec::input("x")]);
        let graph = builder.build().unwrap();
        assert!(graph.unconnected().is_empty());
        assert_eq!(graph.consumers_of("x").unwrap().len(), 1);
        assert_eq!(
            graph.producer_of("x").unwrap().map(|p| p.component.as_str()),
            Some("a")
        );
    }

    #[test]
    fn detects_two_component_cycle() {
        let mut builder = ConnectionBuilder::new();
        let a = builder.add_component(
            "a",
            vec![VariableSpec::input("y"), VariableSpec::output("x")],
        );
        let b = builder.add_component(
            "b",
            vec![VariableSpec::input("x"), VariableSpec::output("y")],
        );
        builder.add_component("c", vec![VariableSpec::input("y")]);
        let graph = builder.build().unwrap();
        assert_eq!(graph.cycles(), vec![vec![a, b]]);
    }

    #[test]
    fn self_feedback_is_a_cycle() {
        let mut builder = ConnectionBuilder::new();
        let a = builder.add_component(
            "a",
            vec![VariableSpec::input("x"), VariableSpec::output("x")],
        );
        let graph = builder.build().unwrap();
        assert_eq!(graph.cycles(), vec![vec![a]]);
    }

    #[test]
    fn block_cycles_ignore_internal_edges() {
        let mut builder = ConnectionBuilder::new();
        let a = builder.add_component(
            "a",
            vec![VariableSpec::input("y"), VariableSpec::output("x")],
        );
        let b = builder.add_component(
            "b",
            vec![VariableSpec::input("x"), VariableSpec::output("y")],
        );
        let c = builder.add_component(
            "c",
            vec![VariableSpec::input("y"), VariableSpec::output("z")],
        );
        let graph = builder.build().unwrap();

        // {a, b} grouped: the loop lives inside block 0.
        assert!(graph.block_cycles(&[vec![a, b], vec![c]]).is_empty());
        // Split apart: blocks 0 and 1 form a cycle.
        assert_eq!(graph.block_cycles(&[vec![a], vec![b], vec![c]]), vec![vec![0, 1]]);
    }

    #[test]
    fn outputs_of_selected_components() {
        let mut builder = ConnectionBuilder::new();
        let a = builder.add_component("a", vec![VariableSpec::output("x")]);
        let b = builder.add_component("b", vec![VariableSpec::output("y")]);
        let graph = builder.build().unwrap();
        let x = graph.store().id("x").unwrap();
        let y = graph.store().id("y").unwrap();
        assert_eq!(graph.outputs_of(&[a]), vec![x]);
        assert_eq!(graph.outputs_of(&[a, b]), vec![x, y]);
    }
}
