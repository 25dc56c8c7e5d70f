//! ac-project: declarative configuration format and validation.
//!
//! A configuration names the model tree (groups and service leaves), the
//! solvers attached to it, optional optimization declarations and the
//! snapshot files used for inputs and outputs. YAML and JSON are both
//! accepted; the format follows the file extension.

pub mod schema;
pub mod validate;

use std::path::{Path, PathBuf};

pub use schema::*;
pub use validate::{ValidationError, validate_config};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unsupported file format for {path}: expected .yml, .yaml or .json")]
    UnsupportedFormat { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialization format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> ProjectResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yml" | "yaml") => Ok(FileFormat::Yaml),
            Some("json") => Ok(FileFormat::Json),
            _ => Err(ProjectError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

pub(crate) fn read_file(path: &Path) -> ProjectResult<String> {
    std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &Path, content: &str) -> ProjectResult<()> {
    std::fs::write(path, content).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_yaml(content: &str) -> ProjectResult<Config> {
    let config: Config = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn parse_json(content: &str) -> ProjectResult<Config> {
    let config: Config = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load and validate a configuration file.
///
/// Relative snapshot paths are resolved against the file's directory.
pub fn load_config(path: &Path) -> ProjectResult<Config> {
    let format = FileFormat::from_path(path)?;
    let content = read_file(path)?;
    let mut config = match format {
        FileFormat::Yaml => parse_yaml(&content)?,
        FileFormat::Json => parse_json(&content)?,
    };
    if let Some(dir) = path.parent() {
        resolve_paths(&mut config, dir);
    }
    tracing::debug!(path = %path.display(), title = ?config.title, "configuration loaded");
    Ok(config)
}

pub fn save_config(path: &Path, config: &Config) -> ProjectResult<()> {
    validate_config(config)?;
    let content = match FileFormat::from_path(path)? {
        FileFormat::Yaml => serde_yaml::to_string(config)?,
        FileFormat::Json => serde_json::to_string_pretty(config)?,
    };
    write_file(path, &content)
}

/// Make `input_file` and `output_file` absolute with respect to `base`.
pub fn resolve_paths(config: &mut Config, base: &Path) {
    for file in [&mut config.input_file, &mut config.output_file]
        .into_iter()
        .flatten()
    {
        if file.is_relative() {
            *file = base.join(&*file);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            FileFormat::from_path(Path::new("a/b.YML")).unwrap(),
            FileFormat::Yaml
        );
        assert_eq!(
            FileFormat::from_path(Path::new("c.json")).unwrap(),
            FileFormat::Json
        );
        assert!(matches!(
            FileFormat::from_path(Path::new("c.xml")),
            Err(ProjectError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let mut config = parse_yaml(
            "model: { name: root, service: math.linear }\n\
             input_file: in.yml\n\
             output_file: /abs/out.yml\n",
        )
        .unwrap();
        resolve_paths(&mut config, Path::new("/data/run"));
        assert_eq!(config.input_file, Some(PathBuf::from("/data/run/in.yml")));
        assert_eq!(config.output_file, Some(PathBuf::from("/abs/out.yml")));
    }
}
