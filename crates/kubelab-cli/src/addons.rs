//! Platform add-ons installed into the lab cluster
//!
//! Each add-on is a pinned Helm chart plus the readiness wait that must pass
//! before the next one is installed. Values are tuned for a single-node kind
//! cluster.

use kubelab_common::ARGOCD_NAMESPACE;

use crate::runner::Invocation;

/// What to wait on after a chart is installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitTarget {
    /// `kubectl rollout status` on a deployment
    Rollout { deployment: &'static str },
    /// `kubectl wait --for=condition=Ready` on pods matching a selector
    PodsReady { selector: &'static str },
}

/// A Helm-installed platform component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOn {
    pub release: &'static str,
    pub repo_name: &'static str,
    pub repo_url: &'static str,
    pub chart: &'static str,
    pub version: &'static str,
    pub namespace: &'static str,
    /// `--set` values
    pub values: &'static [&'static str],
    /// `--set-string` values, for values that must stay strings
    pub string_values: &'static [&'static str],
    pub wait: WaitTarget,
}

/// Add-ons in install order
pub fn platform_addons() -> Vec<AddOn> {
    vec![
        AddOn {
            release: "ingress-nginx",
            repo_name: "ingress-nginx",
            repo_url: "https://kubernetes.github.io/ingress-nginx",
            chart: "ingress-nginx/ingress-nginx",
            version: "4.11.3",
            namespace: "ingress-nginx",
            values: &[
                "controller.hostPort.enabled=true",
                "controller.service.type=NodePort",
                "controller.watchIngressWithoutClass=true",
                "controller.ingressClassResource.default=true",
                "controller.admissionWebhooks.enabled=false",
            ],
            string_values: &["controller.nodeSelector.ingress-ready=true"],
            wait: WaitTarget::PodsReady {
                selector: "app.kubernetes.io/component=controller",
            },
        },
        AddOn {
            release: "metrics-server",
            repo_name: "metrics-server",
            repo_url: "https://kubernetes-sigs.github.io/metrics-server/",
            chart: "metrics-server/metrics-server",
            version: "3.12.2",
            namespace: "kube-system",
            values: &["args={--kubelet-insecure-tls}"],
            string_values: &[],
            wait: WaitTarget::Rollout {
                deployment: "metrics-server",
            },
        },
        AddOn {
            release: "sealed-secrets",
            repo_name: "sealed-secrets",
            repo_url: "https://bitnami-labs.github.io/sealed-secrets",
            chart: "sealed-secrets/sealed-secrets",
            version: "2.16.2",
            namespace: "kube-system",
            values: &["fullnameOverride=sealed-secrets-controller"],
            string_values: &[],
            wait: WaitTarget::Rollout {
                deployment: "sealed-secrets-controller",
            },
        },
        AddOn {
            release: "argocd",
            repo_name: "argo",
            repo_url: "https://argoproj.github.io/argo-helm",
            chart: "argo/argo-cd",
            version: "7.7.0",
            namespace: ARGOCD_NAMESPACE,
            values: &[
                "server.ingress.enabled=true",
                "server.ingress.ingressClassName=nginx",
                "server.ingress.hostname=argocd.local",
                "dex.enabled=false",
            ],
            string_values: &["configs.params.server\\.insecure=true"],
            wait: WaitTarget::Rollout {
                deployment: "argocd-server",
            },
        },
    ]
}

impl AddOn {
    /// `helm repo add --force-update`
    pub fn repo_add(&self) -> Invocation {
        Invocation::new(
            "helm",
            [
                "repo",
                "add",
                self.repo_name,
                self.repo_url,
                "--force-update",
            ],
        )
    }

    /// `helm upgrade --install` at the pinned version
    pub fn install(&self, context: &str) -> Invocation {
        let mut args: Vec<String> = [
            "upgrade",
            "--install",
            self.release,
            self.chart,
            "--version",
            self.version,
            "--namespace",
            self.namespace,
            "--create-namespace",
            "--kube-context",
            context,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for value in self.values {
            args.push("--set".to_string());
            args.push(value.to_string());
        }
        for value in self.string_values {
            args.push("--set-string".to_string());
            args.push(value.to_string());
        }

        Invocation::new("helm", args)
    }

    /// Bounded readiness wait
    pub fn wait(&self, context: &str, timeout_secs: u64) -> Invocation {
        let timeout = format!("--timeout={}s", timeout_secs);
        match &self.wait {
            WaitTarget::Rollout { deployment } => Invocation::new(
                "kubectl",
                [
                    "--context".to_string(),
                    context.to_string(),
                    "-n".to_string(),
                    self.namespace.to_string(),
                    "rollout".to_string(),
                    "status".to_string(),
                    format!("deployment/{}", deployment),
                    timeout,
                ],
            ),
            WaitTarget::PodsReady { selector } => Invocation::new(
                "kubectl",
                [
                    "--context",
                    context,
                    "-n",
                    self.namespace,
                    "wait",
                    "--for=condition=Ready",
                    "pod",
                    "--selector",
                    *selector,
                    timeout.as_str(),
                ],
            ),
        }
    }
}
