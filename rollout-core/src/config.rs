//! `rollout.yaml`: optional operator configuration.
//!
//! Every field has a default, so an absent file and an empty file behave the
//! same. Resolution order: explicit path → `./rollout.yaml` → defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::ApplicationName;

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = "rollout.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    /// Namespace holding the ArgoCD installation and its `Application` objects.
    pub argocd_namespace: String,
    /// Root of `environments/<env>/helm-values/`.
    pub values_root: PathBuf,
    pub sync_poll: SyncPollConfig,
    /// Pause between the active selector flip and scaling blue down.
    pub settle_delay_secs: u64,
    /// Applications checked by `rollout smoke` when no `--app` is given.
    pub smoke_applications: Vec<ApplicationName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncPollConfig {
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl Default for SyncPollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_attempts: 30,
        }
    }
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            argocd_namespace: "argocd".to_string(),
            values_root: PathBuf::from("gitops-solution"),
            sync_poll: SyncPollConfig::default(),
            settle_delay_secs: 5,
            smoke_applications: ["app1-dev", "app1-staging", "app1-production"]
                .into_iter()
                .map(ApplicationName::from)
                .collect(),
        }
    }
}

impl RolloutConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.sync_poll.interval_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.sync_poll.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "sync_poll.max_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Load a config file that must exist.
pub fn load_from(path: &Path) -> Result<RolloutConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(RolloutConfig::default());
    }
    let config: RolloutConfig =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate(path)?;
    Ok(config)
}

/// `<dir>/rollout.yaml` if present, otherwise defaults.
pub fn load_at(dir: &Path) -> Result<RolloutConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() {
        load_from(&path)
    } else {
        Ok(RolloutConfig::default())
    }
}

/// Explicit path if given, else `load_at` on the current directory.
pub fn load(explicit: Option<&Path>) -> Result<RolloutConfig, ConfigError> {
    match explicit {
        Some(path) => load_from(path),
        None => {
            let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
                path: PathBuf::from("."),
                source,
            })?;
            load_at(&cwd)
        }
    }
}
