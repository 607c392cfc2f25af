//! ArgoCD `Application` operations, driven through `kubectl`.
//!
//! Applications live in the ArgoCD namespace; their workloads live in the
//! namespace named after the environment suffix and carry the label
//! `app.kubernetes.io/instance=<application>`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{json, Value};

use rollout_core::{
    ApplicationName, Environment, HealthStatus, HelmParameter, SyncStatus,
    FALLBACK_RESOURCE_KINDS,
};

use crate::error::SyncError;
use crate::exec::ExecError;
use crate::kubectl::Kubectl;
use crate::poll::{poll_until, PollOutcome, PollPolicy, Sleeper};

const APPLICATION: &str = "application";
const ADMIN_SECRET: &str = "argocd-initial-admin-secret";
const INSTANCE_LABEL: &str = "app.kubernetes.io/instance";

// ---------------------------------------------------------------------------
// Prerequisites and credentials
// ---------------------------------------------------------------------------

/// `kubectl` is runnable and the ArgoCD namespace exists.
pub fn check_prerequisites(kubectl: &Kubectl<'_>, argocd_namespace: &str) -> Result<(), SyncError> {
    if !kubectl.client_available() {
        return Err(SyncError::PrerequisiteMissing(
            "kubectl is not installed. Please install it first.".to_string(),
        ));
    }
    if !kubectl.namespace_exists(argocd_namespace) {
        return Err(SyncError::PrerequisiteMissing(format!(
            "ArgoCD namespace '{argocd_namespace}' not found. Please install ArgoCD first."
        )));
    }
    Ok(())
}

/// Decoded password from the `argocd-initial-admin-secret` secret.
pub fn admin_password(kubectl: &Kubectl<'_>, argocd_namespace: &str) -> Result<String, SyncError> {
    let encoded = kubectl.jsonpath("secret", ADMIN_SECRET, argocd_namespace, "{.data.password}")?;
    if encoded.is_empty() {
        return Err(SyncError::Credential(format!(
            "secret {ADMIN_SECRET} has no password field"
        )));
    }
    decode_password(&encoded)
}

fn decode_password(encoded: &str) -> Result<String, SyncError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| SyncError::Credential(format!("password is not valid base64: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| SyncError::Credential(format!("password is not valid UTF-8: {e}")))
}

// ---------------------------------------------------------------------------
// Patches
// ---------------------------------------------------------------------------

/// Merge patch carrying the raw values document and its derived parameters.
pub fn values_patch(values: &str, parameters: &[HelmParameter]) -> Value {
    json!({
        "spec": {
            "source": {
                "helm": {
                    "parameters": parameters,
                    "values": values,
                }
            }
        }
    })
}

/// Merge patch enabling automated sync with prune and self-heal.
pub fn auto_sync_patch() -> Value {
    json!({
        "spec": {
            "syncPolicy": {
                "automated": { "prune": true, "selfHeal": true }
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Application handle
// ---------------------------------------------------------------------------

/// What a single sync-status probe saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    Status(SyncStatus),
    /// The status query itself failed.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollAttempt {
    pub attempt: u32,
    pub max_attempts: u32,
    pub observed: Observed,
}

pub struct Application<'k> {
    kubectl: &'k Kubectl<'k>,
    argocd_namespace: &'k str,
    name: ApplicationName,
}

impl<'k> Application<'k> {
    pub fn new(kubectl: &'k Kubectl<'k>, argocd_namespace: &'k str, name: ApplicationName) -> Self {
        Self {
            kubectl,
            argocd_namespace,
            name,
        }
    }

    pub fn name(&self) -> &ApplicationName {
        &self.name
    }

    pub fn exists(&self) -> bool {
        self.kubectl
            .resource_exists(APPLICATION, &self.name.0, self.argocd_namespace)
    }

    /// [`SyncError::ApplicationNotFound`] unless the application exists.
    pub fn require(&self) -> Result<(), SyncError> {
        if self.exists() {
            Ok(())
        } else {
            Err(SyncError::ApplicationNotFound {
                application: self.name.clone(),
                namespace: self.argocd_namespace.to_string(),
            })
        }
    }

    pub fn sync_status(&self) -> Result<SyncStatus, ExecError> {
        self.jsonpath("{.status.sync.status}").map(SyncStatus)
    }

    pub fn health_status(&self) -> Result<HealthStatus, ExecError> {
        self.jsonpath("{.status.health.status}").map(HealthStatus)
    }

    fn jsonpath(&self, path: &str) -> Result<String, ExecError> {
        self.kubectl
            .jsonpath(APPLICATION, &self.name.0, self.argocd_namespace, path)
    }

    /// Push the values document verbatim and as parameters.
    pub fn apply_values(&self, values: &str, parameters: &[HelmParameter]) -> Result<(), SyncError> {
        tracing::info!(
            "patching {} with {} helm parameters",
            self.name,
            parameters.len()
        );
        self.kubectl.merge_patch(
            APPLICATION,
            &self.name.0,
            self.argocd_namespace,
            &values_patch(values, parameters),
        )
    }

    pub fn enable_auto_sync(&self) -> Result<(), SyncError> {
        self.kubectl.merge_patch(
            APPLICATION,
            &self.name.0,
            self.argocd_namespace,
            &auto_sync_patch(),
        )
    }

    /// Poll until the sync status reads `Synced` or the attempt ceiling is hit.
    ///
    /// A failed status query counts as a not-yet-synced observation. Returns
    /// the number of attempts used.
    pub fn wait_for_sync(
        &self,
        policy: &PollPolicy,
        sleeper: &dyn Sleeper,
        mut on_attempt: impl FnMut(&PollAttempt),
    ) -> Result<u32, SyncError> {
        let outcome = poll_until(policy, sleeper, |attempt| {
            let observed = match self.sync_status() {
                Ok(status) => Observed::Status(status),
                Err(err) => Observed::Unavailable(err.to_string()),
            };
            tracing::debug!("{} sync poll {attempt}: {observed:?}", self.name);
            let synced = matches!(&observed, Observed::Status(s) if s.is_synced());
            on_attempt(&PollAttempt {
                attempt,
                max_attempts: policy.max_attempts,
                observed,
            });
            synced.then_some(())
        });

        match outcome {
            PollOutcome::Ready { attempts, .. } => Ok(attempts),
            PollOutcome::Exhausted { attempts } => Err(SyncError::SyncTimeout {
                application: self.name.clone(),
                attempts,
            }),
        }
    }

    /// Stream the workload resources owned by this application.
    pub fn list_resources(&self) -> Result<(), ExecError> {
        let selector = format!("{INSTANCE_LABEL}={}", self.name);
        match self.name.environment() {
            Some(env) => self.kubectl.list_resources(
                env.resource_kinds(),
                Some(env.as_str()),
                &selector,
            ),
            None => self
                .kubectl
                .list_resources(FALLBACK_RESOURCE_KINDS, None, &selector),
        }
    }

    pub fn environment(&self) -> Option<Environment> {
        self.name.environment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_patch_has_expected_shape() {
        let patch = values_patch(
            "replicaCount: 5\n",
            &[HelmParameter::new("replicaCount", "5")],
        );
        assert_eq!(
            patch,
            json!({
                "spec": { "source": { "helm": {
                    "parameters": [{ "name": "replicaCount", "value": "5" }],
                    "values": "replicaCount: 5\n",
                }}}
            })
        );
    }

    #[test]
    fn auto_sync_enables_prune_and_self_heal() {
        let patch = auto_sync_patch();
        assert_eq!(patch["spec"]["syncPolicy"]["automated"]["prune"], json!(true));
        assert_eq!(
            patch["spec"]["syncPolicy"]["automated"]["selfHeal"],
            json!(true)
        );
    }

    #[test]
    fn decodes_base64_password() {
        assert_eq!(decode_password("czNjcjN0").unwrap(), "s3cr3t");
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode_password("not base64!").unwrap_err();
        assert!(matches!(err, SyncError::Credential(_)));
    }
}
