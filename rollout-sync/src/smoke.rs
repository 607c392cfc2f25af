//! Smoke checks over a list of ArgoCD applications.

use rollout_core::{ApplicationName, Environment, HealthStatus, SyncStatus};

use crate::argocd::Application;
use crate::kubectl::Kubectl;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Passed {
        sync: SyncStatus,
        health: HealthStatus,
    },
    Missing,
    NoSyncStatus,
    NoHealthStatus {
        sync: SyncStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCheck {
    pub application: ApplicationName,
    pub outcome: CheckOutcome,
}

impl AppCheck {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Passed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmokeReport {
    pub checks: Vec<AppCheck>,
}

impl SmokeReport {
    /// True only when every application passed.
    pub fn success(&self) -> bool {
        self.checks.iter().all(AppCheck::passed)
    }

    pub fn failed(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed()).count()
    }
}

/// Progress notifications for the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmokeEvent<'a> {
    Testing(&'a ApplicationName),
    Missing,
    CheckingSync,
    Sync(&'a SyncStatus),
    CheckingHealth,
    Health(&'a HealthStatus),
    /// Status query failed or returned nothing.
    StatusUnavailable { what: &'static str },
    ListingResources(Option<Environment>),
    ResourceListingFailed(String),
    Completed,
}

/// Run the checks for one application. Resource listing failures are reported
/// but do not fail the check.
pub fn check_application(
    kubectl: &Kubectl<'_>,
    argocd_namespace: &str,
    name: &ApplicationName,
    on_event: &mut dyn FnMut(SmokeEvent<'_>),
) -> AppCheck {
    on_event(SmokeEvent::Testing(name));
    let app = Application::new(kubectl, argocd_namespace, name.clone());
    let finish = |outcome| AppCheck {
        application: name.clone(),
        outcome,
    };

    if !app.exists() {
        on_event(SmokeEvent::Missing);
        return finish(CheckOutcome::Missing);
    }

    on_event(SmokeEvent::CheckingSync);
    let sync = match app.sync_status() {
        Ok(sync) if !sync.is_empty() => sync,
        _ => {
            on_event(SmokeEvent::StatusUnavailable { what: "sync" });
            return finish(CheckOutcome::NoSyncStatus);
        }
    };
    on_event(SmokeEvent::Sync(&sync));

    on_event(SmokeEvent::CheckingHealth);
    let health = match app.health_status() {
        Ok(health) if !health.is_empty() => health,
        _ => {
            on_event(SmokeEvent::StatusUnavailable { what: "health" });
            return finish(CheckOutcome::NoHealthStatus { sync });
        }
    };
    on_event(SmokeEvent::Health(&health));

    on_event(SmokeEvent::ListingResources(app.environment()));
    if let Err(err) = app.list_resources() {
        tracing::warn!("resource listing for {name} failed: {err}");
        on_event(SmokeEvent::ResourceListingFailed(err.to_string()));
    }

    on_event(SmokeEvent::Completed);
    finish(CheckOutcome::Passed { sync, health })
}

/// Check every application in order; one failure does not stop the others.
pub fn run(
    kubectl: &Kubectl<'_>,
    argocd_namespace: &str,
    applications: &[ApplicationName],
    mut on_event: impl FnMut(SmokeEvent<'_>),
) -> SmokeReport {
    let checks = applications
        .iter()
        .map(|name| check_application(kubectl, argocd_namespace, name, &mut on_event))
        .collect();
    SmokeReport { checks }
}
