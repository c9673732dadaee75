//! Root Argo CD application (app-of-apps)

use serde_json::{json, Value};

use kubelab_common::ARGOCD_NAMESPACE;

use crate::config::GitopsConfig;

/// Name of the root application
pub const ROOT_APPLICATION: &str = "root";

/// Root Application syncing `path` at `revision` from `repo_url`.
///
/// The repository and revision are also passed to the root chart as Helm
/// parameters so the child applications it renders track the same source.
pub fn root_application(repo_url: &str, gitops: &GitopsConfig) -> Value {
    json!({
        "apiVersion": "argoproj.io/v1alpha1",
        "kind": "Application",
        "metadata": {
            "name": ROOT_APPLICATION,
            "namespace": ARGOCD_NAMESPACE,
            "finalizers": ["resources-finalizer.argocd.argoproj.io"],
        },
        "spec": {
            "project": "default",
            "source": {
                "repoURL": repo_url,
                "targetRevision": gitops.revision,
                "path": gitops.path,
                "helm": {
                    "parameters": [
                        { "name": "repoURL", "value": repo_url },
                        { "name": "targetRevision", "value": gitops.revision },
                    ],
                },
            },
            "destination": {
                "server": "https://kubernetes.default.svc",
                "namespace": ARGOCD_NAMESPACE,
            },
            "syncPolicy": {
                "automated": { "prune": true, "selfHeal": true },
                "syncOptions": ["CreateNamespace=true"],
            },
        },
    })
}
