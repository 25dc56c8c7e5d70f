use ac_app::*;
use ac_components::ServiceRegistry;
use ac_project::{DriverKind, parse_yaml};

fn problem(yaml: &str) -> Problem {
    let config = parse_yaml(yaml).unwrap();
    let mut p = Problem::from_config(&config, &mut ServiceRegistry::with_builtins()).unwrap();
    p.setup().unwrap();
    p
}

fn bowl(driver: &str, extra: &str) -> String {
    format!(
        r#"
model:
  name: root
  children:
    - {{ name: bowl, service: math.quadratic, options: {{ center: 3.0, curvature: 1.0 }} }}
    - {{ name: copy, service: math.linear, options: {{ output: z }} }}
optimization:
  driver: {{ kind: {driver}, max_iterations: 200, tolerance: 1.0e-8 }}
  design_variables:
    - {{ name: x, lower: 0.0, upper: 10.0 }}
  objective: {{ name: y }}
{extra}
"#
    )
}

#[test]
fn nelder_mead_finds_quadratic_minimum() {
    let mut p = problem(&bowl("nelder_mead", ""));
    let result = p.run_driver().unwrap();
    assert!(result.success, "{result}");
    assert_eq!(result.driver, DriverKind::NelderMead);
    assert_eq!(result.failed_evaluations, 0);
    assert!((result.design[0].1 - 3.0).abs() < 1e-2, "{result}");
    assert!(result.objective < 1e-4);

    assert_eq!(p.state(), ProblemState::Optimized);
    assert!((p.get_scalar("x", None).unwrap() - result.design[0].1).abs() < 1e-12);
}

#[test]
fn gradient_finds_quadratic_minimum() {
    let mut p = problem(&bowl("gradient", ""));
    let result = p.run_driver().unwrap();
    assert!(result.success, "{result}");
    assert!(result.converged, "{result}");
    assert!((result.design[0].1 - 3.0).abs() < 1e-3, "{result}");
}

#[test]
fn maximize_flips_the_objective() {
    let mut p = problem(
        r#"
model:
  name: root
  service: math.quadratic
  options: { center: 7.0, curvature: -2.0, offset: 5.0 }
optimization:
  design_variables:
    - { name: x, lower: 0.0, upper: 10.0, initial: 1.0 }
  objective: { name: y, maximize: true }
"#,
    );
    let result = p.run_driver().unwrap();
    assert!(result.success);
    assert!((result.design[0].1 - 7.0).abs() < 1e-2, "{result}");
    assert!((result.objective - 5.0).abs() < 1e-3);
}

#[test]
fn active_constraint_moves_the_optimum() {
    let mut p = problem(&bowl(
        "nelder_mead",
        "  constraints:\n    - { name: z, upper: 2.0 }",
    ));
    let result = p.run_driver().unwrap();
    assert!(result.success, "{result}");
    assert!(result.constraint_violation <= FEASIBILITY_TOLERANCE);
    assert!((result.design[0].1 - 2.0).abs() < 1e-2, "{result}");
    assert!((result.objective - 1.0).abs() < 2e-2);
}

#[test]
fn failed_evaluations_are_counted() {
    let mut p = problem(
        r#"
model:
  name: root
  children:
    - { name: bowl, service: math.quadratic, options: { center: 3.0 } }
    - { name: guard, service: math.linear, options: { output: z, min_input: 4.0 } }
optimization:
  design_variables:
    - { name: x, lower: 0.0, upper: 10.0 }
  objective: { name: y }
"#,
    );
    let result = p.run_driver().unwrap();
    assert!(result.success, "{result}");
    assert!(result.failed_evaluations > 0);
    assert!(result.failed_evaluations < result.evaluations);
    assert!((result.design[0].1 - 4.0).abs() < 1e-2, "{result}");
}

#[test]
fn infeasible_problem_ends_in_optimization_failed() {
    let mut p = problem(&bowl(
        "nelder_mead",
        "  constraints:\n    - { name: z, lower: 20.0 }",
    ));
    let result = p.run_driver().unwrap();
    assert!(!result.success);
    assert!(result.constraint_violation > FEASIBILITY_TOLERANCE);
    assert_eq!(p.state(), ProblemState::OptimizationFailed);
}

#[test]
fn unknown_design_variable_reports_its_key() {
    let mut p = problem(&bowl("nelder_mead", "").replace("name: x, lower", "name: w, lower"));
    let err = p.run_driver().unwrap_err();
    let AppError::ConfigurationAssembly { path, .. } = err else {
        panic!("expected a configuration error, got {err}");
    };
    assert_eq!(path, "optimization.design_variables[0].name");
    assert_eq!(p.state(), ProblemState::Setup);
}

#[test]
fn driver_needs_an_optimization_block() {
    let mut p = problem("model: { name: root, service: math.linear }");
    assert!(matches!(p.run_driver(), Err(AppError::NoOptimization)));
}

#[test]
fn computed_variable_cannot_be_a_design_variable() {
    let mut p = problem(
        r#"
model:
  name: root
  children:
    - { name: feed, service: math.linear, options: { input: p, output: x, initial: 5.0 } }
    - { name: bowl, service: math.quadratic, options: { center: 3.0 } }
optimization:
  design_variables:
    - { name: p, lower: 0.0, upper: 10.0 }
    - { name: x, lower: 0.0, upper: 10.0 }
  objective: { name: y }
"#,
    );
    let err = p.run_driver().unwrap_err();
    let AppError::ConfigurationAssembly { path, reason } = err else {
        panic!("expected a configuration error, got {err}");
    };
    assert_eq!(path, "optimization.design_variables[1].name");
    assert!(reason.contains("feed"), "{reason}");
    assert_eq!(p.state(), ProblemState::Setup);
    assert!(p.get_scalar("x", None).unwrap().is_nan());
}
