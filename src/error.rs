use std::path::PathBuf;
use thiserror::Error;

/// Failure to load, parse or validate a priority configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported config format for {0} (expected .yaml, .yml, .toml or .json)")]
    UnsupportedFormat(PathBuf),
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to render TOML config: {0}")]
    TomlRender(#[from] toml::ser::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("invalid config override '{entry}': {reason}")]
    Override { entry: String, reason: String },
}

/// Failure to build a consolidated record for one span group
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("cannot merge an empty span group")]
    EmptyGroup,
    #[error("primary rule '{0}' is not part of the span group")]
    PrimaryRuleMissing(String),
}
