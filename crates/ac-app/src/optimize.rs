//! Optimization driver over a set-up problem.
//!
//! Design variables are scaled to the unit box `[0, 1]^n`; the drivers only
//! ever see scaled points. Every point is evaluated on its own clone of the
//! problem, so points of one batch run in parallel. Constraints enter the
//! merit function as a quadratic penalty on their normalized violation.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use ac_project::{DriverDef, DriverKind, OptimizationDef};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::batch::isolate;
use crate::error::{AppError, AppResult};
use crate::problem::{Problem, ProblemState};

/// Weight of the squared constraint violation in the merit function.
pub const PENALTY_WEIGHT: f64 = 1.0e6;

/// Largest normalized violation still counted as feasible.
pub const FEASIBILITY_TOLERANCE: f64 = 1.0e-4;

/// Finite-difference step in scaled coordinates.
const FD_STEP: f64 = 1.0e-6;

/// Edge length of the initial Nelder-Mead simplex in scaled coordinates.
const SIMPLEX_STEP: f64 = 0.1;

const MAX_BACKTRACKS: usize = 40;
const ARMIJO_C1: f64 = 1.0e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub driver: DriverKind,
    /// A feasible point with a finite objective was found.
    pub success: bool,
    /// The driver met its tolerance before the iteration cap.
    pub converged: bool,
    pub iterations: usize,
    pub evaluations: usize,
    pub failed_evaluations: usize,
    /// Best design, in the units of each design variable.
    pub design: Vec<(String, f64)>,
    /// Unscaled objective at the best design.
    pub objective: f64,
    /// Largest normalized constraint violation at the best design.
    pub constraint_violation: f64,
}

impl fmt::Display for OptimizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:?}: {} after {} iterations ({} evaluations, {} failed)",
            self.driver,
            if self.success { "optimized" } else { "failed" },
            self.iterations,
            self.evaluations,
            self.failed_evaluations
        )?;
        for (name, value) in &self.design {
            writeln!(f, "  {name} = {value:.6e}")?;
        }
        write!(
            f,
            "  objective = {:.6e}, max violation = {:.3e}",
            self.objective, self.constraint_violation
        )
    }
}

#[derive(Debug, Clone)]
struct DesignVariable {
    name: String,
    lower: f64,
    upper: f64,
    units: Option<String>,
}

impl DesignVariable {
    fn to_physical(&self, u: f64) -> f64 {
        self.lower + u.clamp(0.0, 1.0) * (self.upper - self.lower)
    }

    fn to_scaled(&self, x: f64) -> f64 {
        let span = self.upper - self.lower;
        if span > 0.0 {
            ((x - self.lower) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
struct Objective {
    name: String,
    /// Scaler, negated when maximizing.
    factor: f64,
    units: Option<String>,
}

#[derive(Debug, Clone)]
struct Constraint {
    name: String,
    lower: Option<f64>,
    upper: Option<f64>,
    units: Option<String>,
}

impl Constraint {
    /// Violation relative to the magnitude of the violated bound.
    fn violation(&self, g: f64) -> f64 {
        let below = self
            .lower
            .map_or(0.0, |lo| (lo - g).max(0.0) / lo.abs().max(1.0));
        let above = self
            .upper
            .map_or(0.0, |hi| (g - hi).max(0.0) / hi.abs().max(1.0));
        below.max(above)
    }
}

struct Evaluation {
    merit: f64,
    objective: f64,
    violation: f64,
    problem: Problem,
}

struct Evaluator<'a> {
    base: &'a Problem,
    design: Vec<DesignVariable>,
    objective: Objective,
    constraints: Vec<Constraint>,
    evaluations: AtomicUsize,
    failures: AtomicUsize,
}

impl Evaluator<'_> {
    fn evaluate(&self, u: &[f64]) -> AppResult<Evaluation> {
        let mut problem = self.base.clone();
        for (dv, &ui) in self.design.iter().zip(u) {
            problem.set(&dv.name, dv.to_physical(ui), dv.units.as_deref())?;
        }
        problem.run_model()?.into_result()?;

        let objective = problem.get_scalar(&self.objective.name, self.objective.units.as_deref())?;
        let mut penalty = 0.0;
        let mut violation: f64 = 0.0;
        for c in &self.constraints {
            let v = c.violation(problem.get_scalar(&c.name, c.units.as_deref())?);
            penalty += v * v;
            violation = violation.max(v);
        }
        Ok(Evaluation {
            merit: self.objective.factor * objective + PENALTY_WEIGHT * penalty,
            objective,
            violation,
            problem,
        })
    }

    /// Evaluate one point, counting failures; a failed point scores `+inf`.
    fn run(&self, u: &[f64]) -> Option<Evaluation> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        match isolate(|| self.evaluate(u)) {
            Ok(eval) if eval.merit.is_finite() => Some(eval),
            Ok(eval) => {
                warn!(point = ?u, merit = eval.merit, "evaluation produced a non-finite merit");
                self.failures.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(reason) => {
                debug!(point = ?u, %reason, "evaluation failed");
                self.failures.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn merits(&self, points: &[Vec<f64>]) -> Vec<f64> {
        points
            .par_iter()
            .map(|u| self.run(u).map_or(f64::INFINITY, |e| e.merit))
            .collect()
    }
}

/// Result of one driver in scaled coordinates.
#[derive(Debug, Clone, PartialEq)]
struct DriverOutcome {
    best: Vec<f64>,
    value: f64,
    iterations: usize,
    converged: bool,
}

fn project(u: &mut [f64]) {
    for ui in u {
        *ui = ui.clamp(0.0, 1.0);
    }
}

/// Bounded Nelder-Mead: every trial point is projected onto the unit box.
fn nelder_mead(
    f: &mut dyn FnMut(&[Vec<f64>]) -> Vec<f64>,
    x0: &[f64],
    settings: &DriverDef,
) -> DriverOutcome {
    let n = x0.len();
    let mut simplex = vec![x0.to_vec()];
    for i in 0..n {
        let mut vertex = x0.to_vec();
        vertex[i] = if vertex[i] + SIMPLEX_STEP <= 1.0 {
            vertex[i] + SIMPLEX_STEP
        } else {
            vertex[i] - SIMPLEX_STEP
        };
        simplex.push(vertex);
    }
    let mut values = f(&simplex);

    let mut converged = false;
    let mut iterations = 0;
    while iterations < settings.max_iterations {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let spread = values[n] - values[0];
        let diameter = simplex[1..]
            .iter()
            .map(|v| {
                v.iter()
                    .zip(&simplex[0])
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0, f64::max)
            })
            .fold(0.0, f64::max);
        if spread <= settings.tolerance * (1.0 + values[0].abs())
            && diameter <= settings.tolerance.sqrt()
        {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let worst = simplex[n].clone();
        let along = |t: f64| {
            let mut p: Vec<f64> = centroid
                .iter()
                .zip(&worst)
                .map(|(c, w)| c + t * (c - w))
                .collect();
            project(&mut p);
            p
        };

        let reflected = along(1.0);
        let fr = f(std::slice::from_ref(&reflected))[0];
        if fr < values[0] {
            let expanded = along(2.0);
            let fe = f(std::slice::from_ref(&expanded))[0];
            if fe < fr {
                simplex[n] = expanded;
                values[n] = fe;
            } else {
                simplex[n] = reflected;
                values[n] = fr;
            }
            continue;
        }
        if fr < values[n - 1] {
            simplex[n] = reflected;
            values[n] = fr;
            continue;
        }

        let (contracted, limit) = if fr < values[n] {
            (along(0.5), fr)
        } else {
            (along(-0.5), values[n])
        };
        let fc = f(std::slice::from_ref(&contracted))[0];
        if fc < limit {
            simplex[n] = contracted;
            values[n] = fc;
            continue;
        }

        // Shrink towards the best vertex.
        let best = simplex[0].clone();
        let shrunk: Vec<Vec<f64>> = simplex[1..]
            .iter()
            .map(|v| v.iter().zip(&best).map(|(x, b)| b + 0.5 * (x - b)).collect())
            .collect();
        let shrunk_values = f(&shrunk);
        for (i, (vertex, value)) in shrunk.into_iter().zip(shrunk_values).enumerate() {
            simplex[i + 1] = vertex;
            values[i + 1] = value;
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);
    DriverOutcome {
        best: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

/// Central differences, one-sided at the bounds; all points in one batch.
fn fd_gradient(f: &mut dyn FnMut(&[Vec<f64>]) -> Vec<f64>, x: &[f64]) -> Vec<f64> {
    let mut points = Vec::with_capacity(2 * x.len());
    let mut steps = Vec::with_capacity(x.len());
    for i in 0..x.len() {
        let hi = (x[i] + FD_STEP).min(1.0);
        let lo = (x[i] - FD_STEP).max(0.0);
        let mut plus = x.to_vec();
        plus[i] = hi;
        let mut minus = x.to_vec();
        minus[i] = lo;
        points.push(plus);
        points.push(minus);
        steps.push(hi - lo);
    }
    let values = f(&points);
    steps
        .iter()
        .enumerate()
        .map(|(i, h)| (values[2 * i] - values[2 * i + 1]) / h)
        .collect()
}

/// Projected steepest descent with Armijo backtracking.
fn projected_gradient(
    f: &mut dyn FnMut(&[Vec<f64>]) -> Vec<f64>,
    x0: &[f64],
    settings: &DriverDef,
) -> DriverOutcome {
    let mut x = x0.to_vec();
    let mut fx = f(std::slice::from_ref(&x))[0];
    let mut converged = false;
    let mut iterations = 0;

    while iterations < settings.max_iterations && fx.is_finite() {
        let grad = fd_gradient(f, &x);
        if grad.iter().any(|g| !g.is_finite()) {
            warn!(iteration = iterations, "gradient is not finite; stopping");
            break;
        }
        let projected: Vec<f64> = x
            .iter()
            .zip(&grad)
            .map(|(&xi, &gi)| {
                if (xi <= 0.0 && gi > 0.0) || (xi >= 1.0 && gi < 0.0) {
                    0.0
                } else {
                    gi
                }
            })
            .collect();
        let norm = projected.iter().map(|g| g * g).sum::<f64>().sqrt();
        if norm <= settings.tolerance {
            converged = true;
            break;
        }
        iterations += 1;

        let mut alpha = 1.0_f64.min(0.5 / norm);
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            let mut trial: Vec<f64> = x.iter().zip(&grad).map(|(xi, gi)| xi - alpha * gi).collect();
            project(&mut trial);
            let decrease: f64 = x
                .iter()
                .zip(&trial)
                .zip(&grad)
                .map(|((xi, ti), gi)| gi * (xi - ti))
                .sum();
            let ft = f(std::slice::from_ref(&trial))[0];
            if ft <= fx - ARMIJO_C1 * decrease {
                accepted = Some((trial, ft));
                break;
            }
            alpha *= 0.5;
        }

        let Some((trial, ft)) = accepted else {
            converged = norm <= settings.tolerance.sqrt();
            debug!(iteration = iterations, norm, "line search stalled");
            break;
        };
        let step = x
            .iter()
            .zip(&trial)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        let change = fx - ft;
        x = trial;
        fx = ft;
        if step <= settings.tolerance && change <= settings.tolerance * (1.0 + fx.abs()) {
            converged = true;
            break;
        }
    }

    DriverOutcome {
        best: x,
        value: fx,
        iterations,
        converged,
    }
}

impl Problem {
    /// Run the optimization declared in the configuration.
    pub fn run_driver(&mut self) -> AppResult<OptimizationResult> {
        let definition = self.optimization.clone().ok_or(AppError::NoOptimization)?;
        self.run_driver_with(&definition)
    }

    /// Optimize over clones of this problem, which must be freshly set up.
    ///
    /// The best point is written back into this problem's store. The final
    /// state is `Optimized` when that point is feasible with a finite
    /// objective, `OptimizationFailed` otherwise.
    pub fn run_driver_with(
        &mut self,
        definition: &OptimizationDef,
    ) -> AppResult<OptimizationResult> {
        if self.state() != ProblemState::Setup {
            return Err(AppError::InvalidState {
                operation: "run_driver",
                state: self.state(),
            });
        }
        let (design, x0) = self.design_variables(definition)?;
        let objective = Objective {
            name: self.scalar_variable(&definition.objective.name, "optimization.objective.name")?,
            factor: definition.objective.scaler
                * if definition.objective.maximize { -1.0 } else { 1.0 },
            units: definition.objective.units.clone(),
        };
        let constraints = definition
            .constraints
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let name =
                    self.scalar_variable(&c.name, &format!("optimization.constraints[{i}].name"))?;
                Ok(Constraint {
                    name,
                    lower: c.equals.or(c.lower),
                    upper: c.equals.or(c.upper),
                    units: c.units.clone(),
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        let base = self.clone();
        self.set_state(ProblemState::Optimizing);
        let evaluator = Evaluator {
            base: &base,
            design,
            objective,
            constraints,
            evaluations: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        };
        info!(
            driver = ?definition.driver.kind,
            design_variables = x0.len(),
            constraints = evaluator.constraints.len(),
            "optimization started"
        );

        let mut batch = |points: &[Vec<f64>]| evaluator.merits(points);
        let outcome = match definition.driver.kind {
            DriverKind::NelderMead => nelder_mead(&mut batch, &x0, &definition.driver),
            DriverKind::Gradient => projected_gradient(&mut batch, &x0, &definition.driver),
        };

        let final_eval = evaluator.run(&outcome.best);
        let evaluations = evaluator.evaluations.load(Ordering::Relaxed);
        let failed = evaluator.failures.load(Ordering::Relaxed);
        if failed > 0 {
            warn!("{failed} out of {evaluations} evaluations failed");
        }

        let design: Vec<(String, f64)> = evaluator
            .design
            .iter()
            .zip(&outcome.best)
            .map(|(dv, &u)| (dv.name.clone(), dv.to_physical(u)))
            .collect();

        let result = match final_eval {
            Some(eval) => {
                let success = eval.objective.is_finite() && eval.violation <= FEASIBILITY_TOLERANCE;
                let result = OptimizationResult {
                    driver: definition.driver.kind,
                    success,
                    converged: outcome.converged,
                    iterations: outcome.iterations,
                    evaluations,
                    failed_evaluations: failed,
                    design,
                    objective: eval.objective,
                    constraint_violation: eval.violation,
                };
                self.replace_store_from(eval.problem);
                result
            }
            None => OptimizationResult {
                driver: definition.driver.kind,
                success: false,
                converged: outcome.converged,
                iterations: outcome.iterations,
                evaluations,
                failed_evaluations: failed,
                design,
                objective: f64::INFINITY,
                constraint_violation: f64::INFINITY,
            },
        };

        if result.success {
            self.set_state(ProblemState::Optimized);
            info!(
                objective = result.objective,
                iterations = result.iterations,
                merit = outcome.value,
                "optimization finished"
            );
        } else {
            self.set_state(ProblemState::OptimizationFailed);
            warn!(
                objective = result.objective,
                violation = result.constraint_violation,
                "optimization found no feasible point"
            );
        }
        Ok(result)
    }

    fn scalar_variable(&self, name: &str, path: &str) -> AppResult<String> {
        let entry = self
            .connections()?
            .store()
            .get(name)
            .map_err(|e| AppError::assembly(path, e.to_string()))?;
        if entry.value.as_scalar().is_none() {
            return Err(AppError::assembly(path, format!("'{name}' is not a scalar")));
        }
        Ok(name.to_string())
    }

    /// Scaled design variables and the scaled starting point.
    fn design_variables(
        &self,
        definition: &OptimizationDef,
    ) -> AppResult<(Vec<DesignVariable>, Vec<f64>)> {
        let mut design = Vec::with_capacity(definition.design_variables.len());
        let mut x0 = Vec::with_capacity(definition.design_variables.len());
        for (i, def) in definition.design_variables.iter().enumerate() {
            let path = format!("optimization.design_variables[{i}]");
            let name_path = format!("{path}.name");
            let name = self.scalar_variable(&def.name, &name_path)?;
            let store = self.connections()?.store();
            if let Ok(entry) = store.get(&name)
                && let Some(producer) = &entry.producer
            {
                return Err(AppError::assembly(
                    &name_path,
                    format!("'{name}' is computed by '{}'", producer.component),
                ));
            }
            let dv = DesignVariable {
                name,
                lower: def.lower,
                upper: def.upper,
                units: def.units.clone(),
            };
            let start = match def.initial {
                Some(x) => x,
                None => {
                    let current = self.get_scalar(&dv.name, dv.units.as_deref())?;
                    if current.is_nan() {
                        0.5 * (dv.lower + dv.upper)
                    } else {
                        current
                    }
                }
            };
            x0.push(dv.to_scaled(start));
            design.push(dv);
        }
        Ok((design, x0))
    }
}
