//! Error types for rollout-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the values-file editor and environment parsing.
#[derive(Debug, Error)]
pub enum ValuesError {
    /// I/O failure, annotated with the path being touched.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid environment '{0}'; must be one of: dev, staging, production")]
    InvalidEnvironment(String),

    /// Empty key or a dotted key with an empty segment such as `image..tag`.
    #[error("invalid values key '{0}'")]
    InvalidKey(String),
}

/// Errors from loading [`crate::config::RolloutConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    /// Parsed, but a field holds a value the commands cannot run with.
    #[error("invalid config at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ValuesError {
    ValuesError::Io {
        path: path.into(),
        source,
    }
}
