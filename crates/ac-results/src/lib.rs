//! ac-results: variable snapshot files and batch case storage.

pub mod hash;
pub mod snapshot;
pub mod store;
pub mod types;

pub use hash::{compute_batch_id, config_hash};
pub use snapshot::{Snapshot, VariableRecord};
pub use store::CaseStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Format(#[from] ac_project::ProjectError),

    #[error("Variable '{name}' appears more than once in snapshot")]
    DuplicateVariable { name: String },

    #[error("Batch not found: {batch_id}")]
    BatchNotFound { batch_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}

/// Current time as RFC 3339, for manifests.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}
