use std::path::PathBuf;

use ac_app::*;
use ac_components::ServiceRegistry;
use ac_core::Value;
use ac_project::parse_yaml;
use ac_results::{Snapshot, VariableRecord};

const MODEL: &str = r#"
model:
  name: root
  children:
    - name: a
      service: math.linear
      options: { input: length, output: doubled, units: m, gain: 2.0 }
    - name: b
      service: math.linear
      options: { input: bias, output: shifted, initial: 0.5 }
"#;

fn problem() -> Problem {
    let config = parse_yaml(MODEL).unwrap();
    let mut p = Problem::from_config(&config, &mut ServiceRegistry::with_builtins()).unwrap();
    p.setup().unwrap();
    p
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ac_app_io_{}_{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn needed_inputs_list_mandatory_then_optional() {
    let dir = temp_dir("needed");
    let path = dir.join("inputs.yml");
    let snapshot = write_needed_inputs(&problem(), &path, None).unwrap();

    let names: Vec<&str> = snapshot.names().collect();
    assert_eq!(names, ["length", "bias"]);
    assert!(snapshot.get("length").unwrap().value.is_unset());
    assert_eq!(snapshot.get("length").unwrap().units.as_deref(), Some("m"));
    assert_eq!(snapshot.get("bias").unwrap().value, Value::Scalar(0.5));

    let reread = Snapshot::read(&path).unwrap();
    assert_eq!(
        reread.to_yaml_string().unwrap(),
        snapshot.to_yaml_string().unwrap()
    );
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn reference_values_are_converted_to_declared_units() {
    let dir = temp_dir("reference");
    let reference = dir.join("reference.json");
    Snapshot::from_records(vec![
        VariableRecord::new("length", 1500.0).units("mm"),
        VariableRecord::new("bias", 1.0).units("kg"),
        VariableRecord::new("unrelated", 3.0),
    ])
    .unwrap()
    .write(&reference)
    .unwrap();

    let path = dir.join("inputs.yml");
    let snapshot = write_needed_inputs(&problem(), &path, Some(&reference)).unwrap();
    let length = snapshot.get("length").unwrap();
    assert!((length.value.as_scalar().unwrap() - 1.5).abs() < 1e-12);
    assert_eq!(length.units.as_deref(), Some("m"));
    // kg cannot become dimensionless: the declared default is kept.
    assert_eq!(snapshot.get("bias").unwrap().value, Value::Scalar(0.5));
    assert!(!snapshot.contains("unrelated"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_reference_file_is_an_error() {
    let dir = temp_dir("no_reference");
    let err = write_needed_inputs(&problem(), &dir.join("in.yml"), Some(&dir.join("absent.yml")))
        .unwrap_err();
    assert!(matches!(err, AppError::MissingInputFile { .. }));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn read_inputs_then_run_and_write_outputs() {
    let dir = temp_dir("round");
    let inputs = dir.join("inputs.yml");
    Snapshot::from_records(vec![
        VariableRecord::new("length", 200.0).units("cm"),
        VariableRecord::new("doubled", 99.0),
        VariableRecord::new("stray", 1.0),
    ])
    .unwrap()
    .write(&inputs)
    .unwrap();

    let mut p = problem();
    let extras = read_inputs(&mut p, &inputs).unwrap();
    let extra_names: Vec<&str> = extras.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(extra_names, ["doubled", "stray"]);
    assert_eq!(p.get_scalar("length", None).unwrap(), 2.0);

    p.run_model().unwrap().into_result().unwrap();
    let outputs = dir.join("outputs.json");
    let written = write_outputs(&p, &outputs).unwrap();
    assert_eq!(written.len(), 4);
    assert_eq!(written.get("doubled").unwrap().value, Value::Scalar(4.0));
    assert_eq!(written.get("shifted").unwrap().value, Value::Scalar(0.5));
    assert_eq!(Snapshot::read(&outputs).unwrap(), written);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn read_inputs_requires_the_file() {
    let mut p = problem();
    let err = read_inputs(&mut p, &temp_dir("absent").join("inputs.yml")).unwrap_err();
    assert!(matches!(err, AppError::MissingInputFile { .. }));
}

#[test]
fn bad_record_leaves_every_input_untouched() {
    let dir = temp_dir("partial");
    let inputs = dir.join("inputs.yml");
    Snapshot::from_records(vec![
        VariableRecord::new("length", 3.0).units("m"),
        VariableRecord::new("bias", vec![1.0, 2.0]),
    ])
    .unwrap()
    .write(&inputs)
    .unwrap();

    let mut p = problem();
    let err = read_inputs(&mut p, &inputs).unwrap_err();
    assert!(matches!(err, AppError::Variable(_)), "{err}");
    assert!(p.get_scalar("length", None).unwrap().is_nan());
    assert_eq!(p.get_scalar("bias", None).unwrap(), 0.5);
    std::fs::remove_dir_all(&dir).ok();
}
