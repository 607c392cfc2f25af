//! `rollout values <app> <env> <key> <value>`: edit a Helm value, push it to
//! the ArgoCD application and wait for the sync.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use rollout_core::{
    values::{self, EditStrategy},
    AppName, ApplicationName, Environment, RolloutConfig,
};
use rollout_sync::{
    argocd::{self, Application, Observed},
    diff::values_diff,
    Kubectl, PollPolicy, SyncError, SystemRunner, ThreadSleeper,
};

use crate::console::{failure, progress, success};

/// Arguments for `rollout values`.
#[derive(Args, Debug)]
pub struct ValuesArgs {
    /// Application name (e.g. app1).
    pub app_name: String,

    /// Environment: dev | staging | production.
    pub environment: String,

    /// Helm value key to modify; dots address nested keys (e.g. image.tag).
    pub key: String,

    /// New value for the key.
    pub value: String,
}

impl ValuesArgs {
    pub fn run(self, config: &RolloutConfig) -> Result<ExitCode> {
        let environment: Environment = self.environment.parse()?;
        let app = AppName::from(self.app_name);
        let application = ApplicationName::for_environment(&app, environment);

        let runner = SystemRunner;
        let kubectl = Kubectl::new(&runner);
        let namespace = config.argocd_namespace.as_str();

        argocd::check_prerequisites(&kubectl, namespace)?;
        let argo = Application::new(&kubectl, namespace, application.clone());
        argo.require()?;

        super::show_admin_password(&kubectl, namespace);

        // Values file.
        progress(format!("Checking current value for {}...", self.key));
        let change =
            values::modify_at(&config.values_root, environment, &app, &self.key, &self.value)
                .with_context(|| format!("failed to update values for '{application}'"))?;
        let path = change.path.display().to_string();

        if change.created_dir {
            progress(format!(
                "Created Helm values directory: {}",
                values::values_dir_at(&config.values_root, environment).display()
            ));
        }
        if change.created_file {
            progress(format!("Created empty values file: {path}"));
        }
        let previous = change.previous.clone().unwrap_or_else(|| "not set".to_string());
        success(format!("Current value: {previous}"));
        progress(format!("Modified {} to {} in {path}", self.key, self.value));
        if let EditStrategy::LineEditFallback { reason } = &change.strategy {
            failure(format!("Structured YAML edit failed: {reason}"));
            progress("Fell back to simple text processing.");
        }

        success(format!("Changes made to {path}:"));
        println!("{}", change.after);
        if let Some(diff) = values_diff(&change.path, &change.before, &change.after) {
            print!("{diff}");
            if !diff.ends_with('\n') {
                println!();
            }
        }

        // Application update.
        progress("Updating ArgoCD application to use our values...");
        let parameters = values::helm_parameters(&change.after);
        argo.apply_values(&change.after, &parameters)
            .with_context(|| format!("failed to patch application '{application}'"))?;
        success("ArgoCD application updated to use our values.");

        progress(format!("Refreshing application {application} in ArgoCD..."));
        argo.enable_auto_sync()
            .with_context(|| format!("failed to enable automated sync on '{application}'"))?;
        success("Application refreshed. ArgoCD will automatically sync the changes.");

        // Sync verification.
        progress("Waiting for sync to complete...");
        let policy = PollPolicy::from(&config.sync_poll);
        let waited = argo.wait_for_sync(&policy, &ThreadSleeper, |attempt| match &attempt.observed {
            Observed::Status(status) if status.is_synced() => {}
            Observed::Status(status) => {
                progress(format!("Current sync status: {status}. Waiting..."))
            }
            Observed::Unavailable(err) => {
                failure(format!("Failed to read sync status: {err}. Waiting..."))
            }
        });
        if let Err(err) = waited {
            if matches!(err, SyncError::SyncTimeout { .. }) {
                failure("Timeout waiting for sync to complete.");
            }
            return Err(err.into());
        }
        success("Application synced successfully.");

        progress("Checking health status...");
        match argo.health_status() {
            Ok(health) => success(format!("Health Status: {health}")),
            Err(err) => failure(format!("Failed to get health status: {err}")),
        }

        progress("Verifying changes...");
        progress(format!("Checking {environment} environment resources..."));
        if let Err(err) = argo.list_resources() {
            failure(format!("Failed to list resources: {err}"));
        }

        println!();
        success(format!("Modification and testing completed for {application}."));
        progress(format!("Key: {}", self.key));
        progress(format!("Old value: {previous}"));
        success(format!("New value: {}", self.value));

        Ok(ExitCode::SUCCESS)
    }
}
