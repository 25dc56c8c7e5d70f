//! Batch result types.

use serde::{Deserialize, Serialize};

use crate::snapshot::VariableRecord;

pub type BatchId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchManifest {
    pub batch_id: BatchId,
    /// SHA-256 of the canonical JSON form of the configuration.
    pub config_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub case_count: usize,
    pub failed_count: usize,
    pub tool_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseStatus {
    Succeeded,
    Failed { reason: String },
}

impl CaseStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CaseStatus::Succeeded)
    }
}

/// One line of `cases.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseRecord {
    pub case_id: String,
    #[serde(flatten)]
    pub status: CaseStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<VariableRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<VariableRecord>,
}
