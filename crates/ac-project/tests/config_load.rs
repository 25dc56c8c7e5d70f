use std::path::PathBuf;

use ac_project::*;

const SIZING: &str = r#"
version: 1
title: Short-range aircraft sizing
input_file: ./inputs.yml
output_file: ./outputs.yml
solver: { nonlinear: nlbgs, max_iterations: 50, atol: 1.0e-10, rtol: 1.0e-10, linear: direct }
model:
  name: root
  children:
    - name: geometry
      service: geometry.wing
    - name: sizing_loop
      solver: { nonlinear: nlbgs, max_iterations: 100 }
      children:
        - { name: weight, service: weight.mtow }
        - { name: propulsion, service: propulsion.engine, implementation: rubber_engine }
        - { name: mission, service: mission.breguet, options: { reserve_fraction: 0.05 } }
optimization:
  driver: { kind: nelder_mead, max_iterations: 200, tolerance: 1.0e-6 }
  design_variables:
    - { name: "data:geometry:wing:aspect_ratio", lower: 6.0, upper: 14.0 }
  objective: { name: "data:weight:aircraft:MTOW" }
  constraints:
    - { name: "data:geometry:wing:span", upper: 36.0, units: m }
"#;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ac_project_{}_{name}", std::process::id()))
}

#[test]
fn parses_sizing_configuration() {
    let config = parse_yaml(SIZING).unwrap();
    assert_eq!(config.title.as_deref(), Some("Short-range aircraft sizing"));
    assert_eq!(config.model.children.len(), 2);

    let sizing = &config.model.children[1];
    assert_eq!(sizing.solver.as_ref().unwrap().max_iterations, Some(100));
    assert!(sizing.promotes);
    let propulsion = &sizing.children[1];
    assert_eq!(propulsion.implementation.as_deref(), Some("rubber_engine"));
    let mission = &sizing.children[2];
    assert_eq!(mission.options["reserve_fraction"], serde_json::json!(0.05));

    let opt = config.optimization.as_ref().unwrap();
    assert_eq!(opt.driver.kind, DriverKind::NelderMead);
    assert_eq!(opt.objective.scaler, 1.0);
    assert!(!opt.objective.maximize);
    assert_eq!(opt.constraints[0].upper, Some(36.0));
}

#[test]
fn yaml_and_json_files_round_trip() {
    let config = parse_yaml(SIZING).unwrap();
    for ext in ["yml", "json"] {
        let path = temp_path(&format!("roundtrip.{ext}"));
        save_config(&path, &config).unwrap();
        let mut loaded = load_config(&path).unwrap();
        // Loading resolved the snapshot paths; undo for comparison.
        loaded.input_file = config.input_file.clone();
        loaded.output_file = config.output_file.clone();
        assert_eq!(loaded, config, "format {ext}");
        std::fs::remove_file(&path).ok();
    }
}

#[test]
fn load_resolves_relative_files() {
    let path = temp_path("relative.yaml");
    std::fs::write(&path, SIZING).unwrap();
    let config = load_config(&path).unwrap();
    let dir = path.parent().unwrap();
    assert_eq!(config.input_file, Some(dir.join("./inputs.yml")));
    std::fs::remove_file(&path).ok();
}

#[test]
fn missing_file_is_io_error() {
    let err = load_config(&temp_path("does_not_exist.yml")).unwrap_err();
    assert!(matches!(err, ProjectError::Io { .. }));
}

#[test]
fn invalid_entries_report_key_paths() {
    let cases = [
        (
            "model: { name: root, children: \
             [ {name: a, service: x}, {name: b, service: y}, {name: c} ] }",
            "model.children[2].service",
        ),
        (
            "model: { name: root, service: x, children: [ {name: a, service: y} ] }",
            "model.children",
        ),
        (
            "model: { name: root, children: \
             [ {name: a, options: { k: 1 }, children: [ {name: b, service: y} ]} ] }",
            "model.children[0].options",
        ),
        (
            "solver: { relaxation: 3.0 }\nmodel: { name: root, service: x }",
            "solver.relaxation",
        ),
        (
            "model: { name: root, service: x }\n\
             optimization: { design_variables: [ { name: v, lower: 2.0, upper: 1.0 } ], \
             objective: { name: y } }",
            "optimization.design_variables[0].upper",
        ),
        (
            "model: { name: root, service: x }\n\
             optimization: { design_variables: \
             [ { name: v, lower: 0.0, upper: 1.0, units: furlong } ], objective: { name: y } }",
            "optimization.design_variables[0].units",
        ),
        (
            "model: { name: \"a.b\", service: x }",
            "model.name",
        ),
        (
            "solver: { fd_scheme: backward }\nmodel: { name: root, service: x }",
            "solver.fd_scheme",
        ),
        (
            "model: { name: root, service: x, solver: { fd_step: 0.0 } }",
            "model.solver.fd_step",
        ),
        (
            "solver: { line_search_beta: 1.0 }\nmodel: { name: root, service: x }",
            "solver.line_search_beta",
        ),
    ];
    for (text, expected) in cases {
        match parse_yaml(text) {
            Err(ProjectError::Validation(err)) => assert_eq!(err.path(), expected, "{text}"),
            other => panic!("expected validation error for {text}, got {other:?}"),
        }
    }
}

#[test]
fn leaf_builders_serialize_compactly() {
    let node = ModelNode::leaf("engine", "propulsion.engine")
        .implementation("fixed_sfc")
        .option("sfc", 1.5e-5)
        .alias("data:propulsion:thrust", "data:propulsion:engine_thrust");
    let text = serde_yaml::to_string(&node).unwrap();
    assert!(!text.contains("promotes"));
    assert!(!text.contains("children"));
    let back: ModelNode = serde_yaml::from_str(&text).unwrap();
    assert_eq!(back, node);
}

mod relaxation {
    use super::*;
    use proptest::prelude::*;

    fn with_relaxation(r: f64) -> String {
        format!("solver: {{ relaxation: {r:e} }}\nmodel: {{ name: root, service: x }}")
    }

    proptest! {
        #[test]
        fn inside_open_interval_is_accepted(r in 1.0e-3f64..1.999) {
            prop_assert!(parse_yaml(&with_relaxation(r)).is_ok());
        }

        #[test]
        fn outside_open_interval_is_rejected(r in prop_oneof![-5.0f64..=0.0, 2.0f64..10.0]) {
            match parse_yaml(&with_relaxation(r)) {
                Err(ProjectError::Validation(err)) => {
                    prop_assert_eq!(err.path(), "solver.relaxation")
                }
                other => prop_assert!(false, "expected a validation error, got {:?}", other),
            }
        }
    }
}
