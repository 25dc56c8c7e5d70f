//! Configuration assembler: model tree + registry -> assembled system.

use std::collections::BTreeSet;

use ac_components::{RegistryError, ServiceRegistry};
use ac_core::{CompId, PATH_SEPARATOR};
use ac_project::{Config, ModelNode, SolverDef};
use ac_solver::{SolverError, SolverSettings};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::system::{AssembledSystem, Group, Leaf, Node};

/// Resolve every service of the model tree and build the group/leaf tree.
///
/// Promotion: names declared beneath a node stay visible at the parent
/// scope unless the node sets `promotes: false`, in which case they are
/// prefixed with `<node name>.`. Leaf aliases rename a local variable
/// before promotion applies.
pub fn build(config: &Config, registry: &mut ServiceRegistry) -> AppResult<AssembledSystem> {
    let mut assembler = Assembler {
        registry,
        next_comp: 0,
    };
    let model = &config.model;
    let root = if model.is_leaf() {
        let leaf = assembler.leaf(model, "model", &model.name, "")?;
        Group {
            name: model.name.clone(),
            path: String::new(),
            config_path: "model".to_string(),
            solver: None,
            children: vec![Node::Leaf(leaf)],
        }
    } else {
        assembler.group(model, "model", "", "")?
    };

    let system = AssembledSystem::new(root);
    info!(
        title = config.title.as_deref().unwrap_or(""),
        leaves = system.leaves().len(),
        groups = system.root().groups().len(),
        "system assembled"
    );
    Ok(system)
}

/// Attach solver settings from the configuration to the groups of `system`.
///
/// The top-level `solver` block goes to the root; a `solver` block on a
/// group node (the root included) applies to that group and takes
/// precedence. Unset fields keep the defaults of [`SolverSettings`].
pub fn attach_solvers(system: &mut AssembledSystem, config: &Config) -> AppResult<()> {
    let root = system.root_mut();
    root.solver = config
        .solver
        .as_ref()
        .map(|def| solver_settings(def, "solver"))
        .transpose()?;
    if !config.model.is_leaf() {
        attach(root, &config.model, "model")?;
    }
    Ok(())
}

fn attach(group: &mut Group, node: &ModelNode, path: &str) -> AppResult<()> {
    if group.name != node.name || group.children.len() != node.children.len() {
        return Err(AppError::assembly(
            path,
            format!("node '{}' does not match the assembled system", node.name),
        ));
    }
    if let Some(def) = &node.solver {
        group.solver = Some(solver_settings(def, &format!("{path}.solver"))?);
    }
    for (i, (child, child_node)) in group.children.iter_mut().zip(&node.children).enumerate() {
        if let Node::Group(g) = child {
            attach(g, child_node, &format!("{path}.children[{i}]"))?;
        }
    }
    Ok(())
}

/// Settings for one `solver` block; `path` is the block's key path.
pub fn solver_settings(def: &SolverDef, path: &str) -> AppResult<SolverSettings> {
    let mut settings = SolverSettings::default();
    if let Some(kind) = &def.nonlinear {
        settings.nonlinear = kind.parse().map_err(|e: SolverError| {
            AppError::assembly(format!("{path}.nonlinear"), e.to_string())
        })?;
    }
    if let Some(kind) = &def.linear {
        settings.linear = kind
            .parse()
            .map_err(|e: SolverError| AppError::assembly(format!("{path}.linear"), e.to_string()))?;
    }
    if let Some(n) = def.max_iterations {
        settings.max_iterations = n;
    }
    if let Some(atol) = def.atol {
        settings.atol = atol;
    }
    if let Some(rtol) = def.rtol {
        settings.rtol = rtol;
    }
    if let Some(relaxation) = def.relaxation {
        settings.relaxation = relaxation;
    }
    if let Some(scheme) = &def.fd_scheme {
        settings.fd_scheme = scheme.parse().map_err(|e: SolverError| {
            AppError::assembly(format!("{path}.fd_scheme"), e.to_string())
        })?;
    }
    if let Some(step) = def.fd_step {
        settings.fd_step = step;
    }
    if let Some(beta) = def.line_search_beta {
        settings.line_search_beta = beta;
    }
    if let Some(n) = def.max_line_search_iters {
        settings.max_line_search_iters = n;
    }
    settings
        .validate()
        .map_err(|e| AppError::assembly(path, e.to_string()))?;
    Ok(settings)
}

struct Assembler<'r> {
    registry: &'r mut ServiceRegistry,
    next_comp: u32,
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}{PATH_SEPARATOR}{name}")
    }
}

fn scoped(prefix: &str, node: &ModelNode) -> String {
    if node.promotes {
        prefix.to_string()
    } else {
        format!("{prefix}{}{PATH_SEPARATOR}", node.name)
    }
}

impl Assembler<'_> {
    fn group(
        &mut self,
        node: &ModelNode,
        config_path: &str,
        path: &str,
        prefix: &str,
    ) -> AppResult<Group> {
        let prefix = scoped(prefix, node);
        let mut children = Vec::with_capacity(node.children.len());
        for (i, child) in node.children.iter().enumerate() {
            let child_config = format!("{config_path}.children[{i}]");
            let child_path = join(path, &child.name);
            children.push(if child.is_leaf() {
                Node::Leaf(self.leaf(child, &child_config, &child_path, &prefix)?)
            } else {
                Node::Group(self.group(child, &child_config, &child_path, &prefix)?)
            });
        }
        Ok(Group {
            name: node.name.clone(),
            path: path.to_string(),
            config_path: config_path.to_string(),
            solver: None,
            children,
        })
    }

    fn leaf(
        &mut self,
        node: &ModelNode,
        config_path: &str,
        path: &str,
        prefix: &str,
    ) -> AppResult<Leaf> {
        let service = node
            .service
            .as_deref()
            .ok_or_else(|| {
                AppError::assembly(format!("{config_path}.service"), "missing service")
            })?;
        let resolved = self
            .registry
            .resolve(service, node.implementation.as_deref(), Some(&node.options))
            .map_err(|e| resolve_error(config_path, node, e))?;

        let declared = resolved.discipline.declare();
        let locals: BTreeSet<&str> = declared.iter().map(|v| v.name.as_str()).collect();
        if let Some(unknown) = node.aliases.keys().find(|k| !locals.contains(k.as_str())) {
            return Err(AppError::assembly(
                format!("{config_path}.aliases.{unknown}"),
                format!("service '{service}' declares no variable '{unknown}'"),
            ));
        }

        let prefix = scoped(prefix, node);
        let mut variables = Vec::with_capacity(declared.len());
        let mut local_names = Vec::with_capacity(declared.len());
        for spec in &declared {
            let global = node.aliases.get(&spec.name).unwrap_or(&spec.name);
            variables.push(spec.renamed(format!("{prefix}{global}")));
            local_names.push(spec.name.clone());
        }

        let comp = CompId::from_index(self.next_comp);
        self.next_comp += 1;
        debug!(
            path,
            service = %resolved.service_id,
            implementation = %resolved.implementation_id,
            variables = variables.len(),
            "leaf resolved"
        );
        Ok(Leaf {
            name: node.name.clone(),
            path: path.to_string(),
            config_path: config_path.to_string(),
            service_id: resolved.service_id,
            implementation_id: resolved.implementation_id,
            discipline: resolved.discipline,
            variables,
            locals: local_names,
            comp,
        })
    }
}

/// Map a registry failure to the configuration key that caused it.
fn resolve_error(config_path: &str, node: &ModelNode, err: RegistryError) -> AppError {
    let key = match &err {
        RegistryError::UnknownImplementation { .. }
        | RegistryError::ImplementationUnavailable { .. }
            if node.implementation.is_some() =>
        {
            "implementation"
        }
        RegistryError::InvalidOptions { .. } | RegistryError::Factory { .. } => "options",
        _ => "service",
    };
    AppError::assembly(format!("{config_path}.{key}"), err.to_string())
}
