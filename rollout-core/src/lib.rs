//! rollout core library: domain types, values-file editing, configuration, errors.
//!
//! - [`types`]: newtypes, [`Environment`] and controller statuses
//! - [`values`]: per-environment Helm values files
//! - [`config`]: `rollout.yaml` loading
//! - [`error`]: [`ValuesError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;
pub mod values;

pub use config::RolloutConfig;
pub use error::{ConfigError, ValuesError};
pub use types::{
    AppName, ApplicationName, Environment, HealthStatus, HelmParameter, SyncStatus,
    FALLBACK_RESOURCE_KINDS,
};
