//! Thin `kubectl` wrapper: argument construction plus capture/stream choice.

use serde_json::Value;

use crate::error::SyncError;
use crate::exec::{CommandRunner, ExecError};

pub const KUBECTL: &str = "kubectl";

/// Builds `kubectl` argument vectors and hands them to a [`CommandRunner`].
pub struct Kubectl<'r> {
    runner: &'r dyn CommandRunner,
}

impl<'r> Kubectl<'r> {
    pub fn new(runner: &'r dyn CommandRunner) -> Self {
        Self { runner }
    }

    pub fn capture(&self, args: Vec<String>) -> Result<String, ExecError> {
        self.runner.capture(KUBECTL, &args)
    }

    pub fn stream(&self, args: Vec<String>) -> Result<(), ExecError> {
        self.runner.stream(KUBECTL, &args)
    }

    /// `kubectl version --client` succeeds.
    pub fn client_available(&self) -> bool {
        self.capture(args(&["version", "--client"])).is_ok()
    }

    pub fn namespace_exists(&self, namespace: &str) -> bool {
        self.capture(args(&["get", "namespace", namespace])).is_ok()
    }

    pub fn resource_exists(&self, kind: &str, name: &str, namespace: &str) -> bool {
        self.capture(args(&["get", kind, name, "-n", namespace]))
            .is_ok()
    }

    /// `kubectl get <kind> <name> -n <ns> -o jsonpath=<path>`.
    pub fn jsonpath(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        path: &str,
    ) -> Result<String, ExecError> {
        let output = format!("jsonpath={path}");
        self.capture(args(&["get", kind, name, "-n", namespace, "-o", &output]))
    }

    /// JSON merge patch, output captured.
    pub fn merge_patch(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        patch: &Value,
    ) -> Result<(), SyncError> {
        let body = serde_json::to_string(patch)?;
        self.capture(args(&[
            "patch", kind, name, "-n", namespace, "--type", "merge", "-p", &body,
        ]))?;
        Ok(())
    }

    /// Default (strategic merge) patch, output streamed.
    pub fn patch_streamed(
        &self,
        kind: &str,
        name: &str,
        namespace: &str,
        patch: &Value,
    ) -> Result<(), SyncError> {
        let body = serde_json::to_string(patch)?;
        self.stream(args(&["patch", kind, name, "-n", namespace, "-p", &body]))?;
        Ok(())
    }

    pub fn scale_deployment(
        &self,
        name: &str,
        namespace: &str,
        replicas: u32,
    ) -> Result<(), ExecError> {
        let replicas = format!("--replicas={replicas}");
        self.stream(args(&["scale", "deployment", name, "-n", namespace, &replicas]))
    }

    /// Blocks until the rollout completes (or kubectl gives up).
    pub fn rollout_status(&self, name: &str, namespace: &str) -> Result<(), ExecError> {
        self.stream(args(&["rollout", "status", "deployment", name, "-n", namespace]))
    }

    /// `kubectl get <kinds> [-n <ns>] -l <selector> -o wide`, streamed.
    pub fn list_resources(
        &self,
        kinds: &[&str],
        namespace: Option<&str>,
        selector: &str,
    ) -> Result<(), ExecError> {
        let kinds = kinds.join(",");
        let mut argv = args(&["get", &kinds]);
        if let Some(namespace) = namespace {
            argv.extend(args(&["-n", namespace]));
        }
        argv.extend(args(&["-l", selector, "-o", "wide"]));
        self.stream(argv)
    }
}

pub(crate) fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| (*s).to_string()).collect()
}
