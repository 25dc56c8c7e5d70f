//! Content-based hashing for batch IDs.

use ac_project::Config;
use sha2::{Digest, Sha256};

use crate::ResultsResult;

/// SHA-256 hex digest of a configuration's JSON form.
pub fn config_hash(config: &Config) -> ResultsResult<String> {
    let json = serde_json::to_string(config)?;
    Ok(format!("{:x}", Sha256::digest(json.as_bytes())))
}

/// Batch ID derived from the configuration, the case IDs and the tool version.
pub fn compute_batch_id(
    config: &Config,
    case_ids: &[String],
    tool_version: &str,
) -> ResultsResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_string(config)?.as_bytes());
    for id in case_ids {
        hasher.update(id.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(tool_version.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_project::parse_yaml;

    fn config(service: &str) -> Config {
        parse_yaml(&format!("model: {{ name: root, service: {service} }}")).unwrap()
    }

    #[test]
    fn hash_stability() {
        let cfg = config("math.linear");
        let ids = vec!["c0".to_string(), "c1".to_string()];
        assert_eq!(
            compute_batch_id(&cfg, &ids, "v1").unwrap(),
            compute_batch_id(&cfg, &ids, "v1").unwrap()
        );
        assert_eq!(config_hash(&cfg).unwrap().len(), 64);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let ids = vec!["c0".to_string()];
        let a = compute_batch_id(&config("math.linear"), &ids, "v1").unwrap();
        let b = compute_batch_id(&config("math.quadratic"), &ids, "v1").unwrap();
        let c = compute_batch_id(&config("math.linear"), &ids, "v2").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
