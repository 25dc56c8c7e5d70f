use ac_core::{Tolerances, Value};
use ac_results::*;
use proptest::prelude::*;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("ac_results_{}_{name}", std::process::id()))
}

fn same_records(a: &Snapshot, b: &Snapshot) -> bool {
    a.len() == b.len()
        && a.iter().zip(b.iter()).all(|(x, y)| {
            x.name == y.name
                && x.units == y.units
                && x.description == y.description
                && x.value.approx_eq(&y.value, Tolerances::default())
        })
}

#[test]
fn array_snapshot_file_is_stable() {
    let original = Snapshot::from_records(vec![
        VariableRecord::new("foo:bar", [1.0, 2.0, 3.0]).units("m"),
    ])
    .unwrap();

    for ext in ["yml", "json"] {
        let path = temp_path(&format!("foo_bar.{ext}"));
        original.write(&path).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        let read = Snapshot::read(&path).unwrap();
        assert_eq!(read.get("foo:bar").unwrap().value, Value::from([1.0, 2.0, 3.0]));
        assert_eq!(read.get("foo:bar").unwrap().units.as_deref(), Some("m"));

        read.write(&path).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second, "format {ext}");
        std::fs::remove_file(&path).ok();
    }
}

#[test]
fn hand_written_yaml_is_accepted() {
    let snapshot = Snapshot::from_yaml_str(
        r#"
variables:
  - name: "data:geometry:wing:area"
    value: 124
    units: m**2
    description: wing reference area
  - name: "data:mission:segments"
    value: [1.0, null, 3.5]
  - name: "data:weight:aircraft:payload"
    value: ~
    units: kg
"#,
    )
    .unwrap();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(
        snapshot.get("data:geometry:wing:area").unwrap().value,
        Value::Scalar(124.0)
    );
    assert!(snapshot.get("data:mission:segments").unwrap().value.has_unset());
    assert!(snapshot.get("data:weight:aircraft:payload").unwrap().value.is_unset());
}

#[test]
fn unknown_extension_is_rejected() {
    let err = Snapshot::new().write(&temp_path("snap.xml")).unwrap_err();
    assert!(matches!(err, ResultsError::Format(_)));
}

fn record_strategy() -> impl Strategy<Value = VariableRecord> {
    let value = prop_oneof![
        (-1e12f64..1e12).prop_map(Value::Scalar),
        prop::collection::vec(-1e12f64..1e12, 1..6).prop_map(Value::Array),
    ];
    (
        "[a-z]{1,8}(:[a-z_]{1,8}){0,3}",
        value,
        prop::option::of(prop::sample::select(vec!["m", "kg", "m**2", "N", "kg/N/s", "NM"])),
        prop::option::of("[A-Za-z ]{0,20}"),
    )
        .prop_map(|(name, value, units, description)| VariableRecord {
            name,
            value,
            units: units.map(str::to_string),
            description,
        })
}

proptest! {
    #[test]
    fn snapshot_round_trip(records in prop::collection::vec(record_strategy(), 0..8)) {
        let mut snapshot = Snapshot::new();
        for record in records {
            snapshot.upsert(record);
        }

        let yaml = Snapshot::from_yaml_str(&snapshot.to_yaml_string().unwrap()).unwrap();
        prop_assert!(same_records(&snapshot, &yaml));

        let json = Snapshot::from_json_str(&snapshot.to_json_string().unwrap()).unwrap();
        prop_assert!(same_records(&snapshot, &json));
    }
}
