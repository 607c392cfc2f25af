pub mod promote;
pub mod smoke;
pub mod values;

use rollout_sync::{argocd, Kubectl};

use crate::console::{failure, progress, success};

/// Print the ArgoCD admin password and how to reach the UI. Never fatal.
pub(crate) fn show_admin_password(kubectl: &Kubectl<'_>, argocd_namespace: &str) {
    progress("Getting ArgoCD admin password...");
    match argocd::admin_password(kubectl, argocd_namespace) {
        Ok(password) => {
            success(format!("ArgoCD admin password retrieved: {password}"));
            progress("To access ArgoCD UI, run:");
            println!("kubectl port-forward svc/argocd-server -n {argocd_namespace} 8080:443");
            println!(
                "Then access ArgoCD at https://localhost:8080 with username: admin, password: {password}"
            );
        }
        Err(err) => failure(format!("Failed to get ArgoCD admin password: {err}")),
    }
}
