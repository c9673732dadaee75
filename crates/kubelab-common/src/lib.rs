//! Common pieces for kubelab: telemetry initialization and lab-wide constants

#![deny(missing_docs)]

pub mod telemetry;

pub use telemetry::{init_telemetry, LogFormat, TelemetryConfig, TelemetryError};

/// Default listen port for the todo API
pub const DEFAULT_API_PORT: u16 = 3000;

/// Default name of the kind cluster created by `kubelab up`
pub const DEFAULT_CLUSTER_NAME: &str = "kubelab";

/// Namespace Argo CD is installed into
pub const ARGOCD_NAMESPACE: &str = "argocd";

/// Host names served by the lab ingress.
///
/// The dev and prod todo-api environments plus the Argo CD UI. These are the
/// entries `kubelab up` adds to the local hosts file.
pub const LAB_HOSTNAMES: &[&str] = &["todo.local", "todo-dev.local", "argocd.local"];
