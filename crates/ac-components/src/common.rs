//! Common utilities for discipline calculations.

use crate::error::{ComponentError, ComponentResult};
use crate::registry::ServiceOptions;
use ac_core::numeric::ensure_finite;

/// Standard gravity (m/s^2)
pub const GRAVITY: f64 = 9.806_65;

/// Ensure a value is finite, returning ComponentError if not.
pub fn check_finite(value: f64, what: &'static str) -> ComponentResult<f64> {
    ensure_finite(value, what).map_err(|_| ComponentError::NonPhysical { what })
}

/// Ensure a value is finite and strictly positive.
pub fn check_positive(value: f64, what: &'static str) -> ComponentResult<f64> {
    let value = check_finite(value, what)?;
    if value <= 0.0 {
        return Err(ComponentError::NonPhysical { what });
    }
    Ok(value)
}

/// Numeric option, with a fallback when the key is absent or null.
pub fn option_f64(options: &ServiceOptions, key: &str, fallback: f64) -> ComponentResult<f64> {
    match options.get(key) {
        None | Some(serde_json::Value::Null) => Ok(fallback),
        Some(value) => value.as_f64().ok_or_else(|| ComponentError::InvalidOption {
            key: key.to_string(),
            reason: "expected a number",
        }),
    }
}

/// Optional numeric option (absent or null gives `None`).
pub fn option_opt_f64(options: &ServiceOptions, key: &str) -> ComponentResult<Option<f64>> {
    match options.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| ComponentError::InvalidOption {
                key: key.to_string(),
                reason: "expected a number",
            }),
    }
}

/// String option, with a fallback when the key is absent or null.
pub fn option_str(options: &ServiceOptions, key: &str, fallback: &str) -> ComponentResult<String> {
    match options.get(key) {
        None | Some(serde_json::Value::Null) => Ok(fallback.to_string()),
        Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(_) => Err(ComponentError::InvalidOption {
            key: key.to_string(),
            reason: "expected a non-empty string",
        }),
    }
}

/// Optional string option.
pub fn option_opt_str(options: &ServiceOptions, key: &str) -> ComponentResult<Option<String>> {
    match options.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ComponentError::InvalidOption {
            key: key.to_string(),
            reason: "expected a string",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(pairs: &[(&str, serde_json::Value)]) -> ServiceOptions {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn numeric_options() {
        let opts = options(&[("a", json!(2.5)), ("b", json!("x")), ("c", json!(null))]);
        assert_eq!(option_f64(&opts, "a", 1.0).unwrap(), 2.5);
        assert_eq!(option_f64(&opts, "missing", 1.0).unwrap(), 1.0);
        assert_eq!(option_f64(&opts, "c", 3.0).unwrap(), 3.0);
        assert!(option_f64(&opts, "b", 1.0).is_err());
        assert_eq!(option_opt_f64(&opts, "c").unwrap(), None);
    }

    #[test]
    fn string_options() {
        let opts = options(&[("input", json!("x")), ("bad", json!(1))]);
        assert_eq!(option_str(&opts, "input", "y").unwrap(), "x");
        assert_eq!(option_str(&opts, "output", "y").unwrap(), "y");
        assert!(option_str(&opts, "bad", "y").is_err());
    }

    #[test]
    fn positivity() {
        assert!(check_positive(1.0, "x").is_ok());
        assert!(check_positive(0.0, "x").is_err());
        assert!(check_finite(f64::INFINITY, "x").is_err());
    }
}
