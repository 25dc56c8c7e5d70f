//! Snapshot services: needed inputs, reading inputs, writing outputs.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use ac_core::{Value, converter};
use ac_results::{Snapshot, VariableRecord};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::problem::Problem;

/// A snapshot entry that is not an unconnected input of the problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraVariable {
    pub name: String,
}

impl fmt::Display for ExtraVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not an unconnected input; ignored", self.name)
    }
}

fn read_existing(path: &Path) -> AppResult<Snapshot> {
    if !path.exists() {
        return Err(AppError::MissingInputFile {
            path: PathBuf::from(path),
        });
    }
    Ok(Snapshot::read(path)?)
}

/// Reference value converted to the declared units and shape, if possible.
fn from_reference(record: &VariableRecord, units: Option<&str>, like: &Value) -> Option<Value> {
    if record.value.shape() != like.shape() {
        warn!(
            variable = %record.name,
            expected = %like.shape(),
            actual = %record.value.shape(),
            "reference value has the wrong shape; keeping default"
        );
        return None;
    }
    match converter(record.units.as_deref(), units) {
        Ok(conv) => Some(record.value.map(|v| conv.apply(v))),
        Err(e) => {
            warn!(
                variable = %record.name,
                error = %e,
                "reference units not convertible; keeping default"
            );
            None
        }
    }
}

/// Write every unconnected input (mandatory first, then optional) to `path`.
///
/// Values come from `reference` where a record of the same name exists
/// (converted to the declared units), otherwise from the declared defaults,
/// which may be unset.
pub fn write_needed_inputs(
    problem: &Problem,
    path: &Path,
    reference: Option<&Path>,
) -> AppResult<Snapshot> {
    let report = problem.unconnected()?;
    let reference = reference.map(read_existing).transpose()?;

    let mut snapshot = Snapshot::new();
    for descriptor in report.all() {
        let mut record = VariableRecord::from(descriptor);
        if let Some(value) = reference
            .as_ref()
            .and_then(|r| r.get(&descriptor.name))
            .and_then(|r| from_reference(r, descriptor.units.as_deref(), &descriptor.value))
        {
            record.value = value;
        }
        snapshot.upsert(record);
    }

    snapshot.write(path)?;
    info!(
        path = %path.display(),
        mandatory = report.mandatory.len(),
        optional = report.optional.len(),
        "needed inputs written"
    );
    Ok(snapshot)
}

/// Set every unconnected input found in the snapshot at `path`.
///
/// Records naming anything else are skipped and returned as warnings. Either
/// every matching record is applied or, on the first bad one, none is.
pub fn read_inputs(problem: &mut Problem, path: &Path) -> AppResult<Vec<ExtraVariable>> {
    let snapshot = read_existing(path)?;
    let unconnected: HashSet<String> = problem
        .unconnected()?
        .all()
        .map(|d| d.name.clone())
        .collect();

    let mut staged = problem.clone();
    let mut extras = Vec::new();
    let mut applied = 0;
    for record in &snapshot {
        if unconnected.contains(&record.name) {
            staged.set(&record.name, record.value.clone(), record.units.as_deref())?;
            applied += 1;
        } else {
            let extra = ExtraVariable {
                name: record.name.clone(),
            };
            warn!(path = %path.display(), "{extra}");
            extras.push(extra);
        }
    }
    *problem = staged;
    info!(path = %path.display(), applied, ignored = extras.len(), "inputs read");
    Ok(extras)
}

/// Snapshot of every variable of the problem.
pub fn output_snapshot(problem: &Problem) -> AppResult<Snapshot> {
    let records = problem
        .variables()?
        .iter()
        .map(VariableRecord::from)
        .collect();
    Ok(Snapshot::from_records(records)?)
}

/// Write every variable (post-run values) to `path`.
pub fn write_outputs(problem: &Problem, path: &Path) -> AppResult<Snapshot> {
    let snapshot = output_snapshot(problem)?;
    snapshot.write(path)?;
    info!(path = %path.display(), variables = snapshot.len(), "outputs written");
    Ok(snapshot)
}
