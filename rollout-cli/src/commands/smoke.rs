//! `rollout smoke`: sync and health checks across ArgoCD applications.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use rollout_core::{ApplicationName, RolloutConfig};
use rollout_sync::{
    argocd,
    smoke::{self, AppCheck, CheckOutcome, SmokeEvent},
    Kubectl, SystemRunner,
};

use crate::console::{failure, header, progress, success};

/// Arguments for `rollout smoke`.
#[derive(Args, Debug)]
pub struct SmokeArgs {
    /// Application to check; repeatable. Defaults to the configured list.
    #[arg(long = "app", value_name = "APPLICATION")]
    pub apps: Vec<String>,
}

#[derive(Tabled)]
struct CheckRow {
    #[tabled(rename = "Application")]
    application: String,
    #[tabled(rename = "Sync")]
    sync: String,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl From<&AppCheck> for CheckRow {
    fn from(check: &AppCheck) -> Self {
        let (sync, health) = match &check.outcome {
            CheckOutcome::Passed { sync, health } => (sync.to_string(), health.to_string()),
            CheckOutcome::Missing => ("-".into(), "-".into()),
            CheckOutcome::NoSyncStatus => ("unknown".into(), "-".into()),
            CheckOutcome::NoHealthStatus { sync } => (sync.to_string(), "unknown".into()),
        };
        let result = match &check.outcome {
            CheckOutcome::Passed { .. } => "ok",
            CheckOutcome::Missing => "missing",
            CheckOutcome::NoSyncStatus | CheckOutcome::NoHealthStatus { .. } => "failed",
        };
        Self {
            application: check.application.to_string(),
            sync,
            health,
            result: result.to_string(),
        }
    }
}

impl SmokeArgs {
    pub fn run(self, config: &RolloutConfig) -> Result<ExitCode> {
        let applications: Vec<ApplicationName> = if self.apps.is_empty() {
            config.smoke_applications.clone()
        } else {
            self.apps.into_iter().map(ApplicationName::from).collect()
        };

        let runner = SystemRunner;
        let kubectl = Kubectl::new(&runner);
        let namespace = config.argocd_namespace.as_str();

        argocd::check_prerequisites(&kubectl, namespace)?;
        super::show_admin_password(&kubectl, namespace);

        let report = smoke::run(&kubectl, namespace, &applications, print_event);

        println!();
        success("All tests completed.");
        if !report.checks.is_empty() {
            let rows: Vec<CheckRow> = report.checks.iter().map(CheckRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        if report.success() {
            Ok(ExitCode::SUCCESS)
        } else {
            failure(format!(
                "{} of {} applications failed.",
                report.failed(),
                report.checks.len()
            ));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_event(event: SmokeEvent<'_>) {
    match event {
        SmokeEvent::Testing(name) => {
            println!();
            header(format!("Testing application: {name}"));
        }
        SmokeEvent::Missing => failure("Application does not exist."),
        SmokeEvent::CheckingSync => progress("Checking sync status..."),
        SmokeEvent::Sync(status) => success(format!("Sync Status: {status}")),
        SmokeEvent::CheckingHealth => progress("Checking health status..."),
        SmokeEvent::Health(status) => success(format!("Health Status: {status}")),
        SmokeEvent::StatusUnavailable { what } => failure(format!("Failed to get {what} status.")),
        SmokeEvent::ListingResources(Some(env)) => {
            progress(format!("Checking {env} environment resources..."))
        }
        SmokeEvent::ListingResources(None) => progress("Checking application resources..."),
        SmokeEvent::ResourceListingFailed(err) => {
            failure(format!("Failed to list resources: {err}"))
        }
        SmokeEvent::Completed => success("Test completed."),
    }
}
