use std::path::PathBuf;
use std::sync::Arc;

use ac_app::*;
use ac_components::{
    ComponentResult, Discipline, DisciplineFactory, Inputs, Outputs, RegisterMode,
    ServiceOptions, ServiceProperties, ServiceRegistry,
};
use ac_graph::VariableSpec;
use ac_project::{Config, parse_yaml};
use ac_results::{CaseStatus, CaseStore, VariableRecord};

const GUARDED: &str = r#"
title: guarded affine
model: { name: root, service: math.linear, options: { gain: 2.0, min_input: 0.0 } }
"#;

fn set_up(config: &Config, registry: &mut ServiceRegistry) -> Problem {
    let mut p = Problem::from_config(config, registry).unwrap();
    p.setup().unwrap();
    p
}

fn cases(values: &[f64]) -> Vec<Case> {
    values
        .iter()
        .enumerate()
        .map(|(i, &x)| Case {
            id: format!("case-{i}"),
            inputs: vec![VariableRecord::new("x", x)],
        })
        .collect()
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ac_app_batch_{}_{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn failing_cases_are_counted_not_fatal() {
    let config = parse_yaml(GUARDED).unwrap();
    let problem = set_up(&config, &mut ServiceRegistry::with_builtins());
    let inputs = [1.0, -2.0, 3.0, 4.0, -5.0, 6.0, 7.0, -8.0, 9.0, 10.0];
    let report = run_batch(&problem, &cases(&inputs)).unwrap();

    assert_eq!(report.len(), 10);
    assert_eq!(report.failed, 3);
    assert_eq!(report.to_string(), "3 out of 10 cases failed");

    let failed: Vec<&str> = report
        .outcomes
        .iter()
        .filter(|o| !o.is_success())
        .map(|o| o.id.as_str())
        .collect();
    assert_eq!(failed, ["case-1", "case-4", "case-7"]);

    let first = report.outcomes[0].result.as_ref().unwrap();
    let y = first.iter().find(|r| r.name == "y").unwrap();
    assert_eq!(y.value.as_scalar(), Some(2.0));

    // The template problem is left untouched.
    assert_eq!(problem.state(), ProblemState::Setup);
    assert!(problem.get("x").unwrap().is_unset());
}

struct Fragile;

impl Discipline for Fragile {
    fn declare(&self) -> Vec<VariableSpec> {
        vec![VariableSpec::input("x"), VariableSpec::output("y")]
    }

    fn compute(&self, inputs: &Inputs, outputs: &mut Outputs) -> ComponentResult<()> {
        let x = inputs.scalar("x")?;
        if x > 100.0 {
            panic!("fragile model exploded at x = {x}");
        }
        outputs.set("y", x * x)
    }
}

#[test]
fn panicking_case_is_isolated() {
    let mut registry = ServiceRegistry::new();
    let factory: DisciplineFactory =
        Arc::new(|_options: &ServiceOptions| -> ComponentResult<Arc<dyn Discipline>> {
            Ok(Arc::new(Fragile))
        });
    registry
        .register("test.fragile", "only", factory, ServiceProperties::new(), RegisterMode::Strict)
        .unwrap();
    let config = parse_yaml("model: { name: root, service: test.fragile }").unwrap();
    let problem = set_up(&config, &mut registry);

    let report = run_batch(&problem, &cases(&[2.0, 500.0, 3.0])).unwrap();
    assert_eq!(report.failed, 1);
    let reason = report.outcomes[1].result.as_ref().unwrap_err();
    assert!(reason.contains("fragile model exploded"), "{reason}");
    assert!(report.outcomes[0].is_success());
    assert!(report.outcomes[2].is_success());
}

#[test]
fn batch_requires_a_set_up_problem() {
    let config = parse_yaml(GUARDED).unwrap();
    let mut problem = set_up(&config, &mut ServiceRegistry::with_builtins());
    problem.set("x", 1.0, None).unwrap();
    problem.run_model().unwrap();
    assert!(matches!(
        run_batch(&problem, &cases(&[1.0])),
        Err(AppError::InvalidState { .. })
    ));
}

#[test]
fn batches_persist_to_the_case_store() {
    let config = parse_yaml(GUARDED).unwrap();
    let problem = set_up(&config, &mut ServiceRegistry::with_builtins());
    let batch = cases(&[1.0, -1.0]);
    let report = run_batch(&problem, &batch).unwrap();

    let dir = temp_dir("persist");
    let store = CaseStore::new(dir.clone()).unwrap();
    let manifest = save_batch(&store, &config, &batch, &report).unwrap();
    assert_eq!(manifest.case_count, 2);
    assert_eq!(manifest.failed_count, 1);
    assert_eq!(manifest.title.as_deref(), Some("guarded affine"));

    let loaded = store.load_cases(&manifest.batch_id).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].status, CaseStatus::Succeeded);
    assert!(matches!(loaded[1].status, CaseStatus::Failed { .. }));
    assert_eq!(loaded[1].inputs[0].name, "x");
    assert!(loaded[1].outputs.is_empty());

    let listed = store.list_batches(&manifest.config_hash).unwrap();
    assert_eq!(listed.len(), 1);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn case_files_load_from_yaml() {
    let dir = temp_dir("case_file");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("cases.yml");
    std::fs::write(
        &path,
        r#"
cases:
  - id: light
    inputs:
      - { name: x, value: 1.0 }
  - id: heavy
    inputs:
      - { name: x, value: 250.0, units: cm }
"#,
    )
    .unwrap();
    let loaded = load_cases(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[1].id, "heavy");
    assert_eq!(loaded[1].inputs[0].units.as_deref(), Some("cm"));
    std::fs::remove_dir_all(&dir).ok();
}
