//! Parallel batch evaluation of independent cases.
//!
//! Every case runs on its own clone of a set-up [`Problem`]; a failing case
//! (error, non-convergence or panic) is recorded and never aborts the batch.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;

use ac_project::{Config, FileFormat};
use ac_results::{
    BatchManifest, CaseRecord, CaseStatus, CaseStore, VariableRecord, compute_batch_id,
    config_hash, timestamp_now,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::io_service::output_snapshot;
use crate::problem::{Problem, ProblemState};

/// One set of input values to evaluate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Case {
    pub id: String,
    #[serde(default)]
    pub inputs: Vec<VariableRecord>,
}

/// Case file layout: `cases: [{ id, inputs: [...] }, ...]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseFile {
    pub cases: Vec<Case>,
}

/// Read a YAML or JSON case file.
pub fn load_cases(path: &Path) -> AppResult<Vec<Case>> {
    let format = FileFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let file: CaseFile = match format {
        FileFormat::Yaml => serde_yaml::from_str(&content).map_err(ac_results::ResultsError::from)?,
        FileFormat::Json => serde_json::from_str(&content).map_err(ac_results::ResultsError::from)?,
    };
    Ok(file.cases)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseOutcome {
    pub id: String,
    /// All variables after the run, or the failure reason.
    pub result: Result<Vec<VariableRecord>, String>,
}

impl CaseOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes in case order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<CaseOutcome>,
    pub failed: usize,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} out of {} cases failed", self.failed, self.outcomes.len())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `f`, turning both errors and panics into a failure message.
pub(crate) fn isolate<T>(f: impl FnOnce() -> AppResult<T>) -> Result<T, String> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn run_case(base: &Problem, case: &Case) -> AppResult<Vec<VariableRecord>> {
    let mut problem = base.clone();
    for record in &case.inputs {
        problem.set(&record.name, record.value.clone(), record.units.as_deref())?;
    }
    problem.run_model()?.into_result()?;
    Ok(output_snapshot(&problem)?.iter().cloned().collect())
}

/// Evaluate every case in parallel against clones of `problem`.
///
/// `problem` must be freshly set up; it is left untouched.
pub fn run_batch(problem: &Problem, cases: &[Case]) -> AppResult<BatchReport> {
    if problem.state() != ProblemState::Setup {
        return Err(AppError::InvalidState {
            operation: "run_batch",
            state: problem.state(),
        });
    }

    let outcomes: Vec<CaseOutcome> = cases
        .par_iter()
        .map(|case| {
            let result = isolate(|| run_case(problem, case));
            if let Err(reason) = &result {
                warn!(case = %case.id, %reason, "case failed");
            }
            CaseOutcome {
                id: case.id.clone(),
                result,
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    let report = BatchReport { outcomes, failed };
    if failed > 0 {
        warn!("{report}");
    } else {
        info!(cases = report.len(), "batch completed");
    }
    Ok(report)
}

/// Persist a batch under its content-derived ID.
pub fn save_batch(
    store: &CaseStore,
    config: &Config,
    cases: &[Case],
    report: &BatchReport,
) -> AppResult<BatchManifest> {
    let case_ids: Vec<String> = cases.iter().map(|c| c.id.clone()).collect();
    let tool_version = env!("CARGO_PKG_VERSION");
    let manifest = BatchManifest {
        batch_id: compute_batch_id(config, &case_ids, tool_version)?,
        config_hash: config_hash(config)?,
        title: config.title.clone(),
        timestamp: timestamp_now(),
        case_count: report.len(),
        failed_count: report.failed,
        tool_version: tool_version.to_string(),
    };

    let records: Vec<CaseRecord> = cases
        .iter()
        .zip(&report.outcomes)
        .map(|(case, outcome)| {
            let (status, outputs) = match &outcome.result {
                Ok(outputs) => (CaseStatus::Succeeded, outputs.clone()),
                Err(reason) => (
                    CaseStatus::Failed {
                        reason: reason.clone(),
                    },
                    Vec::new(),
                ),
            };
            CaseRecord {
                case_id: case.id.clone(),
                status,
                inputs: case.inputs.clone(),
                outputs,
            }
        })
        .collect();

    store.save_batch(&manifest, &records)?;
    info!(batch_id = %manifest.batch_id, cases = manifest.case_count, "batch saved");
    Ok(manifest)
}
