//! Domain types shared by every rollout command.
//!
//! Statuses reported by ArgoCD stay opaque strings; only `Synced` carries
//! meaning for the poll loop.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValuesError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Base application name, e.g. `app1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppName(pub String);

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for AppName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AppName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of an ArgoCD `Application` object, conventionally `{app}-{environment}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationName(pub String);

impl ApplicationName {
    /// `{app}-{environment}`.
    pub fn for_environment(app: &AppName, environment: Environment) -> Self {
        Self(format!("{}-{}", app.0, environment))
    }

    /// Text after the last `-`, or the whole name when there is none.
    pub fn environment_suffix(&self) -> &str {
        self.0.rsplit('-').next().unwrap_or(&self.0)
    }

    /// The environment named by the suffix, if it is one we know.
    pub fn environment(&self) -> Option<Environment> {
        self.environment_suffix().parse().ok()
    }
}

impl fmt::Display for ApplicationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ApplicationName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ApplicationName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Deployment tier. Doubles as the Kubernetes namespace of the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Staging,
    Production,
}

impl Environment {
    pub fn all() -> &'static [Environment] {
        &[Environment::Dev, Environment::Staging, Environment::Production]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// Resource kinds listed when verifying a deployment in this tier.
    pub fn resource_kinds(self) -> &'static [&'static str] {
        match self {
            Environment::Dev => &["deployments", "services", "configmaps"],
            Environment::Staging => &["deployments", "services", "configmaps", "ingress"],
            Environment::Production => &[
                "deployments",
                "services",
                "configmaps",
                "ingress",
                "hpa",
            ],
        }
    }
}

/// Kinds listed for an application whose environment suffix is unknown.
pub const FALLBACK_RESOURCE_KINDS: &[&str] = &["deployments", "services"];

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ValuesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Environment::Dev),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(ValuesError::InvalidEnvironment(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller statuses
// ---------------------------------------------------------------------------

/// `.status.sync.status` of an Application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncStatus(pub String);

impl SyncStatus {
    pub const SYNCED: &'static str = "Synced";

    pub fn is_synced(&self) -> bool {
        self.0 == Self::SYNCED
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// `.status.health.status` of an Application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HealthStatus(pub String);

impl HealthStatus {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Helm parameters
// ---------------------------------------------------------------------------

/// One entry of `spec.source.helm.parameters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmParameter {
    pub name: String,
    pub value: String,
}

impl HelmParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("dev", Environment::Dev)]
    #[case("staging", Environment::Staging)]
    #[case("production", Environment::Production)]
    fn environment_parses_and_displays(#[case] raw: &str, #[case] env: Environment) {
        assert_eq!(raw.parse::<Environment>().unwrap(), env);
        assert_eq!(env.to_string(), raw);
    }

    #[rstest]
    #[case("prod")]
    #[case("Dev")]
    #[case("")]
    fn environment_rejects_unknown(#[case] raw: &str) {
        let err = raw.parse::<Environment>().unwrap_err();
        assert!(matches!(err, ValuesError::InvalidEnvironment(_)));
        assert!(err.to_string().contains("dev, staging, production"));
    }

    #[test]
    fn production_lists_more_kinds_than_dev() {
        assert_eq!(Environment::Dev.resource_kinds().len(), 3);
        assert_eq!(Environment::Staging.resource_kinds().len(), 4);
        assert!(Environment::Production.resource_kinds().contains(&"hpa"));
    }

    #[test]
    fn application_name_joins_app_and_environment() {
        let name = ApplicationName::for_environment(&AppName::from("app1"), Environment::Staging);
        assert_eq!(name.to_string(), "app1-staging");
        assert_eq!(name.environment(), Some(Environment::Staging));
    }

    #[test]
    fn environment_suffix_uses_last_dash() {
        let name = ApplicationName::from("payments-api-production");
        assert_eq!(name.environment_suffix(), "production");

        let bare = ApplicationName::from("standalone");
        assert_eq!(bare.environment_suffix(), "standalone");
        assert_eq!(bare.environment(), None);
    }

    #[test]
    fn only_exact_synced_counts() {
        assert!(SyncStatus("Synced".into()).is_synced());
        assert!(!SyncStatus("OutOfSync".into()).is_synced());
        assert!(!SyncStatus::default().is_synced());
    }
}
