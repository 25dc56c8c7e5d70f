//! Batch case storage.
//!
//! Layout: `<root>/<batch_id>/manifest.json` plus `cases.jsonl` with one
//! [`CaseRecord`] per line, in case order.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{BatchManifest, CaseRecord};
use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone)]
pub struct CaseStore {
    root_dir: PathBuf,
}

impl CaseStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    /// Store kept next to a configuration file, under `.aerocouple/batches`.
    pub fn for_config(config_path: &Path) -> ResultsResult<Self> {
        let dir = config_path
            .parent()
            .ok_or_else(|| ResultsError::InvalidPath {
                message: "configuration path has no parent directory".to_string(),
            })?;
        Self::new(dir.join(".aerocouple").join("batches"))
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    fn batch_dir(&self, batch_id: &str) -> PathBuf {
        self.root_dir.join(batch_id)
    }

    pub fn has_batch(&self, batch_id: &str) -> bool {
        self.batch_dir(batch_id).join("manifest.json").exists()
    }

    pub fn save_batch(&self, manifest: &BatchManifest, cases: &[CaseRecord]) -> ResultsResult<()> {
        let dir = self.batch_dir(&manifest.batch_id);
        fs::create_dir_all(&dir)?;

        fs::write(
            dir.join("manifest.json"),
            serde_json::to_string_pretty(manifest)?,
        )?;

        let mut lines = String::new();
        for case in cases {
            lines.push_str(&serde_json::to_string(case)?);
            lines.push('\n');
        }
        fs::write(dir.join("cases.jsonl"), lines)?;

        tracing::info!(
            batch = %manifest.batch_id,
            cases = cases.len(),
            dir = %dir.display(),
            "batch saved"
        );
        Ok(())
    }

    pub fn load_manifest(&self, batch_id: &str) -> ResultsResult<BatchManifest> {
        let path = self.batch_dir(batch_id).join("manifest.json");
        if !path.exists() {
            return Err(ResultsError::BatchNotFound {
                batch_id: batch_id.to_string(),
            });
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn load_cases(&self, batch_id: &str) -> ResultsResult<Vec<CaseRecord>> {
        let path = self.batch_dir(batch_id).join("cases.jsonl");
        if !path.exists() {
            return Err(ResultsError::BatchNotFound {
                batch_id: batch_id.to_string(),
            });
        }
        fs::read_to_string(path)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(ResultsError::from))
            .collect()
    }

    /// Manifests of every stored batch produced from a configuration with this hash.
    pub fn list_batches(&self, config_hash: &str) -> ResultsResult<Vec<BatchManifest>> {
        let mut batches = Vec::new();
        if !self.root_dir.exists() {
            return Ok(batches);
        }
        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let batch_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&batch_id)
                    && manifest.config_hash == config_hash
                {
                    batches.push(manifest);
                }
            }
        }
        batches.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(batches)
    }

    pub fn delete_batch(&self, batch_id: &str) -> ResultsResult<()> {
        let dir = self.batch_dir(batch_id);
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}
