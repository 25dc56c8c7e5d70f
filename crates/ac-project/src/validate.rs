//! Configuration validation with key paths.

use std::collections::HashSet;

use ac_core::{NAME_SEPARATOR, PATH_SEPARATOR, Unit};

use crate::schema::{
    CONFIG_VERSION, Config, ConstraintDef, DesignVariableDef, ModelNode, OptimizationDef,
    SolverDef,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{path}: {reason}")]
    Invalid { path: String, reason: String },

    #[error("unsupported configuration version {version} (latest is {latest})")]
    UnsupportedVersion { version: u32, latest: u32 },
}

impl ValidationError {
    fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Key path of the offending entry, e.g. `model.children[2].service`.
    pub fn path(&self) -> &str {
        match self {
            ValidationError::Invalid { path, .. } => path,
            ValidationError::UnsupportedVersion { .. } => "version",
        }
    }
}

pub type ValidationResult = Result<(), ValidationError>;

/// Check a configuration and report the first offending entry.
pub fn validate_config(config: &Config) -> ValidationResult {
    if config.version > CONFIG_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
            latest: CONFIG_VERSION,
        });
    }
    if let Some(solver) = &config.solver {
        validate_solver(solver, "solver")?;
    }
    validate_node(&config.model, "model")?;
    if let Some(optimization) = &config.optimization {
        validate_optimization(optimization, "optimization")?;
    }
    Ok(())
}

fn validate_node(node: &ModelNode, path: &str) -> ValidationResult {
    if node.name.trim().is_empty() {
        return Err(ValidationError::invalid(
            format!("{path}.name"),
            "node name must not be empty",
        ));
    }
    if node.name.contains(PATH_SEPARATOR) || node.name.contains(NAME_SEPARATOR) {
        return Err(ValidationError::invalid(
            format!("{path}.name"),
            format!(
                "node name '{}' must not contain '{PATH_SEPARATOR}' or '{NAME_SEPARATOR}'",
                node.name
            ),
        ));
    }

    if let Some(solver) = &node.solver {
        validate_solver(solver, &format!("{path}.solver"))?;
    }

    match &node.service {
        Some(service) => {
            if service.trim().is_empty() {
                return Err(ValidationError::invalid(
                    format!("{path}.service"),
                    "service id must not be empty",
                ));
            }
            if node.implementation.as_deref().is_some_and(|i| i.trim().is_empty()) {
                return Err(ValidationError::invalid(
                    format!("{path}.implementation"),
                    "implementation id must not be empty",
                ));
            }
            if !node.children.is_empty() {
                return Err(ValidationError::invalid(
                    format!("{path}.children"),
                    "a node with a service cannot have children",
                ));
            }
            if node.solver.is_some() {
                return Err(ValidationError::invalid(
                    format!("{path}.solver"),
                    "solvers attach to groups, not to service leaves",
                ));
            }
            let mut targets = HashSet::new();
            for (local, global) in &node.aliases {
                if global.trim().is_empty() {
                    return Err(ValidationError::invalid(
                        format!("{path}.aliases.{local}"),
                        "alias target must not be empty",
                    ));
                }
                if !targets.insert(global) {
                    return Err(ValidationError::invalid(
                        format!("{path}.aliases.{local}"),
                        format!("'{global}' is the target of more than one alias"),
                    ));
                }
            }
        }
        None => {
            if node.implementation.is_some() {
                return Err(ValidationError::invalid(
                    format!("{path}.implementation"),
                    "implementation given without a service",
                ));
            }
            if !node.options.is_empty() {
                return Err(ValidationError::invalid(
                    format!("{path}.options"),
                    "options given without a service",
                ));
            }
            if !node.aliases.is_empty() {
                return Err(ValidationError::invalid(
                    format!("{path}.aliases"),
                    "aliases are only allowed on leaf nodes",
                ));
            }
            if node.children.is_empty() {
                return Err(ValidationError::invalid(
                    format!("{path}.service"),
                    "node needs either a service or children",
                ));
            }
        }
    }

    let mut names = HashSet::new();
    for (i, child) in node.children.iter().enumerate() {
        let child_path = format!("{path}.children[{i}]");
        if !names.insert(child.name.as_str()) {
            return Err(ValidationError::invalid(
                format!("{child_path}.name"),
                format!("duplicate sibling name '{}'", child.name),
            ));
        }
        validate_node(child, &child_path)?;
    }
    Ok(())
}

fn validate_solver(solver: &SolverDef, path: &str) -> ValidationResult {
    if solver.max_iterations == Some(0) {
        return Err(ValidationError::invalid(
            format!("{path}.max_iterations"),
            "must be at least 1",
        ));
    }
    for (key, value) in [("atol", solver.atol), ("rtol", solver.rtol)] {
        if let Some(v) = value
            && !(v.is_finite() && v >= 0.0)
        {
            return Err(ValidationError::invalid(
                format!("{path}.{key}"),
                format!("tolerance must be finite and non-negative, got {v}"),
            ));
        }
    }
    if let Some(r) = solver.relaxation
        && !(r > 0.0 && r < 2.0)
    {
        return Err(ValidationError::invalid(
            format!("{path}.relaxation"),
            format!("relaxation must lie in (0, 2), got {r}"),
        ));
    }
    if let Some(step) = solver.fd_step
        && !(step.is_finite() && step > 0.0)
    {
        return Err(ValidationError::invalid(
            format!("{path}.fd_step"),
            format!("must be finite and positive, got {step}"),
        ));
    }
    if let Some(beta) = solver.line_search_beta
        && !(beta > 0.0 && beta < 1.0)
    {
        return Err(ValidationError::invalid(
            format!("{path}.line_search_beta"),
            format!("must lie in (0, 1), got {beta}"),
        ));
    }
    if solver.max_line_search_iters == Some(0) {
        return Err(ValidationError::invalid(
            format!("{path}.max_line_search_iters"),
            "must be at least 1",
        ));
    }
    if let Some(scheme) = solver.fd_scheme.as_deref()
        && !matches!(scheme, "forward" | "central")
    {
        return Err(ValidationError::invalid(
            format!("{path}.fd_scheme"),
            format!("expected 'forward' or 'central', got '{scheme}'"),
        ));
    }
    Ok(())
}

fn validate_units(units: Option<&str>, path: &str) -> ValidationResult {
    if let Some(text) = units {
        Unit::parse(text)
            .map_err(|e| ValidationError::invalid(format!("{path}.units"), e.to_string()))?;
    }
    Ok(())
}

fn validate_optimization(opt: &OptimizationDef, path: &str) -> ValidationResult {
    if opt.driver.max_iterations == 0 {
        return Err(ValidationError::invalid(
            format!("{path}.driver.max_iterations"),
            "must be at least 1",
        ));
    }
    if !(opt.driver.tolerance.is_finite() && opt.driver.tolerance > 0.0) {
        return Err(ValidationError::invalid(
            format!("{path}.driver.tolerance"),
            "must be finite and positive",
        ));
    }
    if opt.design_variables.is_empty() {
        return Err(ValidationError::invalid(
            format!("{path}.design_variables"),
            "at least one design variable is required",
        ));
    }

    let mut seen = HashSet::new();
    for (i, dv) in opt.design_variables.iter().enumerate() {
        let dv_path = format!("{path}.design_variables[{i}]");
        if !seen.insert(dv.name.as_str()) {
            return Err(ValidationError::invalid(
                format!("{dv_path}.name"),
                format!("'{}' is declared twice", dv.name),
            ));
        }
        validate_design_variable(dv, &dv_path)?;
    }

    let objective_path = format!("{path}.objective");
    if opt.objective.name.trim().is_empty() {
        return Err(ValidationError::invalid(
            format!("{objective_path}.name"),
            "objective name must not be empty",
        ));
    }
    if !(opt.objective.scaler.is_finite() && opt.objective.scaler != 0.0) {
        return Err(ValidationError::invalid(
            format!("{objective_path}.scaler"),
            "scaler must be finite and non-zero",
        ));
    }
    validate_units(opt.objective.units.as_deref(), &objective_path)?;

    for (i, constraint) in opt.constraints.iter().enumerate() {
        validate_constraint(constraint, &format!("{path}.constraints[{i}]"))?;
    }
    Ok(())
}

fn validate_design_variable(dv: &DesignVariableDef, path: &str) -> ValidationResult {
    if dv.name.trim().is_empty() {
        return Err(ValidationError::invalid(
            format!("{path}.name"),
            "design variable name must not be empty",
        ));
    }
    if !(dv.lower.is_finite() && dv.upper.is_finite()) || dv.lower > dv.upper {
        return Err(ValidationError::invalid(
            format!("{path}.upper"),
            format!("bounds [{}, {}] are not a finite interval", dv.lower, dv.upper),
        ));
    }
    if let Some(x0) = dv.initial
        && !(dv.lower..=dv.upper).contains(&x0)
    {
        return Err(ValidationError::invalid(
            format!("{path}.initial"),
            format!("{x0} lies outside [{}, {}]", dv.lower, dv.upper),
        ));
    }
    validate_units(dv.units.as_deref(), path)
}

fn validate_constraint(c: &ConstraintDef, path: &str) -> ValidationResult {
    if c.name.trim().is_empty() {
        return Err(ValidationError::invalid(
            format!("{path}.name"),
            "constraint name must not be empty",
        ));
    }
    match (c.lower, c.upper, c.equals) {
        (None, None, None) => {
            return Err(ValidationError::invalid(
                path.to_string(),
                "constraint needs 'lower', 'upper' or 'equals'",
            ));
        }
        (Some(_), _, Some(_)) | (_, Some(_), Some(_)) => {
            return Err(ValidationError::invalid(
                format!("{path}.equals"),
                "'equals' cannot be combined with 'lower' or 'upper'",
            ));
        }
        (Some(lo), Some(hi), None) if lo > hi => {
            return Err(ValidationError::invalid(
                format!("{path}.upper"),
                format!("upper bound {hi} is below lower bound {lo}"),
            ));
        }
        _ => {}
    }
    validate_units(c.units.as_deref(), path)
}
